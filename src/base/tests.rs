use crate::base::multierror::MultiError;
use crate::base::neterror::NetError;

#[test]
fn test_net_error_roundtrip() {
    let original = NetError::CouldntConnect;
    let code = original.as_i32();
    assert_eq!(code, 7);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::CouldntConnect));

    let tls = NetError::PeerFailedVerification;
    assert_eq!(NetError::from(tls.as_i32()), tls);
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(9999);
    assert!(matches!(err, NetError::Unknown(9999)));
    assert_eq!(err.as_i32(), 9999);
}

#[test]
fn test_success_code_is_not_an_error() {
    assert_eq!(NetError::from_code(0), None);
    assert_eq!(NetError::from_code(6), Some(NetError::CouldntResolveHost));
}

#[test]
fn test_connect_failure_classification() {
    assert!(NetError::CouldntResolveHost.is_connect_failure());
    assert!(NetError::SslConnectError.is_connect_failure());
    assert!(!NetError::OperationTimedout.is_connect_failure());
    assert!(!NetError::WriteError.is_connect_failure());
}

#[test]
fn test_multi_error_roundtrip() {
    assert_eq!(MultiError::from(-1), MultiError::CallMultiPerform);
    assert_eq!(MultiError::AddedAlready.as_i32(), 7);
    assert_eq!(MultiError::from(42), MultiError::Unknown(42));
}
