//! Scripted transfer engine shared by the integration tests.
//!
//! The engine does no I/O. Tests describe how it reacts to `add` and to
//! each step, and inspect what the coordinator asked of it afterwards.

#![allow(dead_code)]

use multinet::base::multierror::MultiError;
use multinet::base::neterror::NetError;
use multinet::engine::{
    ActionTarget, CompletionMessage, Detached, EasyRequest, EngineNotifier, EventFlags,
    TransferEngine,
};
use multinet::reactor::Socket;
use multinet::transfer::{InfoCode, InfoValue, OptionCode, OptionValue, TransferId, TransferInfo};
use multinet::Error;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

type AddReaction = Box<dyn FnMut(&mut Script, TransferId)>;
type StepReaction = Box<dyn FnMut(&mut Script, ActionTarget, EventFlags)>;

/// Engine state visible to reactions and to the test body.
#[derive(Default)]
pub struct Script {
    notifier: Option<EngineNotifier>,
    transfers: HashMap<TransferId, EasyRequest>,
    infos: HashMap<TransferId, TransferInfo>,
    descriptions: HashMap<TransferId, String>,
    owners: HashMap<Socket, TransferId>,
    messages: VecDeque<CompletionMessage>,
    steps: Vec<(ActionTarget, EventFlags)>,
    added: Vec<TransferId>,
    removed: Vec<TransferId>,
    options: HashMap<TransferId, Vec<(OptionCode, OptionValue)>>,
    reject_next_add: bool,
    on_add: Option<AddReaction>,
    on_step: Option<StepReaction>,
}

impl Script {
    fn notifier(&self) -> &EngineNotifier {
        self.notifier.as_ref().expect("callbacks installed")
    }

    /// Asks for `socket` to be watched (`action` is the raw poll code).
    pub fn watch(&mut self, socket: Socket, action: i32, owner: TransferId) -> i32 {
        if action != 4 {
            self.owners.insert(socket, owner);
        } else {
            self.owners.remove(&socket);
        }
        self.notifier().socket_changed(socket, action, Some(owner))
    }

    pub fn set_timer(&mut self, timeout_ms: i64) {
        self.notifier().set_timer(timeout_ms);
    }

    pub fn clear_timer(&mut self) {
        self.notifier().clear_timer();
    }

    pub fn write(&mut self, id: TransferId, data: &[u8]) -> usize {
        self.transfers[&id].io.write(data)
    }

    pub fn header(&mut self, id: TransferId, line: &str) -> bool {
        self.transfers[&id].io.header(line.as_bytes())
    }

    pub fn read(&mut self, id: TransferId, buf: &mut [u8]) -> usize {
        self.transfers[&id].io.read(buf)
    }

    pub fn set_info(&mut self, id: TransferId, code: InfoCode, value: InfoValue) {
        self.infos.entry(id).or_default().insert(code, value);
    }

    pub fn describe(&mut self, id: TransferId, description: &str) {
        self.descriptions.insert(id, description.to_string());
    }

    pub fn complete(&mut self, id: TransferId, result: Result<(), NetError>) {
        self.messages.push_back(CompletionMessage { id, result });
    }

    pub fn is_running(&self, id: TransferId) -> bool {
        self.transfers.contains_key(&id)
    }

    pub fn running(&self) -> Vec<TransferId> {
        let mut ids: Vec<_> = self.transfers.keys().copied().collect();
        ids.sort_by_key(|id| id.as_u64());
        ids
    }
}

#[derive(Clone, Default)]
pub struct ScriptedEngine {
    script: Rc<RefCell<Script>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reaction run after a transfer is added. Without one the engine asks
    /// to be woken immediately, like libcurl does.
    pub fn on_add(&self, f: impl FnMut(&mut Script, TransferId) + 'static) {
        self.script.borrow_mut().on_add = Some(Box::new(f));
    }

    pub fn on_step(&self, f: impl FnMut(&mut Script, ActionTarget, EventFlags) + 'static) {
        self.script.borrow_mut().on_step = Some(Box::new(f));
    }

    pub fn reject_next_add(&self) {
        self.script.borrow_mut().reject_next_add = true;
    }

    /// Runs `f` against the script outside of any engine call.
    pub fn with<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        f(&mut *self.script.borrow_mut())
    }

    pub fn steps(&self) -> Vec<(ActionTarget, EventFlags)> {
        self.script.borrow().steps.clone()
    }

    pub fn added(&self) -> Vec<TransferId> {
        self.script.borrow().added.clone()
    }

    pub fn removed(&self) -> Vec<TransferId> {
        self.script.borrow().removed.clone()
    }

    pub fn options_for(&self, id: TransferId) -> Vec<(OptionCode, OptionValue)> {
        self.script.borrow().options.get(&id).cloned().unwrap_or_default()
    }
}

impl TransferEngine for ScriptedEngine {
    fn install_callbacks(&mut self, notifier: EngineNotifier) -> Result<(), Error> {
        self.script.borrow_mut().notifier = Some(notifier);
        Ok(())
    }

    fn add(&mut self, id: TransferId, request: EasyRequest) -> Result<(), Error> {
        let mut script = self.script.borrow_mut();
        if std::mem::take(&mut script.reject_next_add) {
            return Err(Error::Multi(MultiError::BadEasyHandle));
        }
        script.added.push(id);
        script.options.insert(id, request.options.clone());
        script.transfers.insert(id, request);

        match script.on_add.take() {
            Some(mut reaction) => {
                reaction(&mut *script, id);
                script.on_add = Some(reaction);
            }
            None => script.set_timer(0),
        }
        Ok(())
    }

    fn remove(&mut self, id: TransferId) -> Result<Detached, Error> {
        let mut script = self.script.borrow_mut();
        if script.transfers.remove(&id).is_none() {
            return Err(Error::Multi(MultiError::BadEasyHandle));
        }
        script.removed.push(id);

        let mut owned: Vec<_> = script
            .owners
            .iter()
            .filter(|(_, owner)| **owner == id)
            .map(|(socket, _)| *socket)
            .collect();
        owned.sort_unstable();
        for socket in owned {
            script.watch(socket, 4, id);
        }

        Ok(Detached {
            info: script.infos.remove(&id).unwrap_or_default(),
            error_description: script.descriptions.remove(&id).unwrap_or_default(),
        })
    }

    fn socket_action(&mut self, target: ActionTarget, flags: EventFlags) -> Result<usize, Error> {
        let mut script = self.script.borrow_mut();
        script.steps.push((target, flags));
        if let Some(mut reaction) = script.on_step.take() {
            reaction(&mut *script, target, flags);
            script.on_step = Some(reaction);
        }
        Ok(script.transfers.len())
    }

    fn next_message(&mut self) -> Option<CompletionMessage> {
        self.script.borrow_mut().messages.pop_front()
    }

    fn version(&self) -> String {
        String::from("scripted/1.0")
    }
}
