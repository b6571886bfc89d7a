//! Mock collaborators shared by the crate's test modules.

use crate::session::{lock, Env, FrameSink, Session};
use hashbrown::HashMap;
use proptree::event::{Action, ActionMap, PropEvent, UserEvent};
use proptree::image::{Cancellable, CodedImage, ImageLoader, ImageMeta};
use proptree::prop::{Prop, PropKey, PropNode, SetValue};
use proptree::sub::{Courier, PropTree, SubCallback, SubHandle, SubRequest, Task, TaskRunner};
use std::collections::VecDeque;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct TestNode;
impl PropNode for TestNode {}

/// A fresh anonymous property handle.
pub fn prop() -> Prop {
    Prop::new(Arc::new(TestNode))
}

struct NullHandle;
impl SubHandle for NullHandle {
    fn want_more_childs(&self) {}
}

pub fn null_handle() -> Box<dyn SubHandle> {
    Box::new(NullHandle)
}

/// Everything the tree was asked to do, keyed by node identity.
#[derive(Debug)]
pub enum TreeCall {
    SetInt(PropKey, i32),
    SetFloat(PropKey, f32),
    SetString(PropKey, String, u8),
    SetVoid(PropKey),
    ToggleInt(PropKey),
    SetDown(Option<PropKey>, String, SetValue),
    ReqMove(Option<PropKey>, Option<PropKey>),
    Select(PropKey),
    Event(PropKey, UserEvent),
}

struct SubState {
    callback: Option<SubCallback>,
    root: Option<PropKey>,
    path: Option<String>,
    names: Vec<String>,
    flags: u16,
    released: Arc<AtomicBool>,
    want_more: Arc<AtomicUsize>,
}

/// Scriptable property tree: records every operation, captures
/// subscription callbacks so tests can play tree events into them.
pub struct ScriptedTree {
    root: Prop,
    finds: Mutex<Vec<(Vec<String>, Prop)>>,
    subs: Mutex<Vec<SubState>>,
    calls: Mutex<Vec<TreeCall>>,
}

impl ScriptedTree {
    pub fn new() -> ScriptedTree {
        ScriptedTree {
            root: prop(),
            finds: Mutex::new(Vec::new()),
            subs: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn root_prop(&self) -> Prop {
        self.root.clone()
    }

    /// Teach `find` to resolve a name path.
    pub fn add_find(&self, names: &[&str], found: Prop) {
        let names = names.iter().map(|n| n.to_string()).collect();
        self.finds.lock().unwrap().push((names, found));
    }

    pub fn sub_count(&self) -> usize {
        self.subs.lock().unwrap().len()
    }

    pub fn sub_request(&self, index: usize) -> (Option<PropKey>, Vec<String>, u16) {
        let subs = self.subs.lock().unwrap();
        let sub = &subs[index];
        (sub.root, sub.names.clone(), sub.flags)
    }

    pub fn sub_path(&self, index: usize) -> Option<String> {
        self.subs.lock().unwrap()[index].path.clone()
    }

    pub fn released(&self, index: usize) -> bool {
        self.subs.lock().unwrap()[index]
            .released
            .load(Ordering::SeqCst)
    }

    pub fn want_more_count(&self, index: usize) -> usize {
        self.subs.lock().unwrap()[index]
            .want_more
            .load(Ordering::SeqCst)
    }

    /// Play a tree event into the captured callback. The callback is taken
    /// out for the duration so it may re-enter the tree.
    pub fn deliver(&self, index: usize, event: PropEvent) {
        let mut callback = self.subs.lock().unwrap()[index]
            .callback
            .take()
            .expect("Subscription has no callback");
        callback(event);
        self.subs.lock().unwrap()[index].callback = Some(callback);
    }

    pub fn take_calls(&self) -> Vec<TreeCall> {
        mem::take(&mut *self.calls.lock().unwrap())
    }

    fn record(&self, call: TreeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

struct ScriptedHandle {
    released: Arc<AtomicBool>,
    want_more: Arc<AtomicUsize>,
}

impl SubHandle for ScriptedHandle {
    fn want_more_childs(&self) {
        self.want_more.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for ScriptedHandle {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

impl PropTree for ScriptedTree {
    fn root(&self) -> Prop {
        self.root.clone()
    }

    fn find(&self, _root: &Prop, names: &[String]) -> Option<Prop> {
        self.finds
            .lock()
            .unwrap()
            .iter()
            .find(|(known, _)| known == names)
            .map(|(_, found)| found.clone())
    }

    fn subscribe(&self, req: SubRequest) -> Box<dyn SubHandle> {
        let released = Arc::new(AtomicBool::new(false));
        let want_more = Arc::new(AtomicUsize::new(0));
        self.subs.lock().unwrap().push(SubState {
            callback: Some(req.callback),
            root: req.root.map(|p| p.key()),
            path: req.path,
            names: req.names,
            flags: req.flags,
            released: released.clone(),
            want_more: want_more.clone(),
        });
        Box::new(ScriptedHandle {
            released,
            want_more,
        })
    }

    fn set_int(&self, p: &Prop, value: i32) {
        self.record(TreeCall::SetInt(p.key(), value));
    }

    fn set_float(&self, p: &Prop, value: f32) {
        self.record(TreeCall::SetFloat(p.key(), value));
    }

    fn set_string(&self, p: &Prop, value: &str, hint: u8) {
        self.record(TreeCall::SetString(p.key(), value.to_string(), hint));
    }

    fn set_void(&self, p: &Prop) {
        self.record(TreeCall::SetVoid(p.key()));
    }

    fn toggle_int(&self, p: &Prop) {
        self.record(TreeCall::ToggleInt(p.key()));
    }

    fn set_down(&self, root: Option<&Prop>, path: &str, value: SetValue) {
        self.record(TreeCall::SetDown(
            root.map(Prop::key),
            path.to_string(),
            value,
        ));
    }

    fn req_move(&self, p: Option<&Prop>, before: Option<&Prop>) {
        self.record(TreeCall::ReqMove(p.map(Prop::key), before.map(Prop::key)));
    }

    fn select(&self, p: &Prop) {
        self.record(TreeCall::Select(p.key()));
    }

    fn send_event(&self, p: &Prop, event: UserEvent) {
        self.record(TreeCall::Event(p.key(), event));
    }
}

/// Name → code table backed action map.
pub struct Actions {
    map: HashMap<String, u32>,
}

impl Actions {
    pub fn new(pairs: &[(&str, u32)]) -> Actions {
        Actions {
            map: pairs
                .iter()
                .map(|(name, code)| (name.to_string(), *code))
                .collect(),
        }
    }
}

impl ActionMap for Actions {
    fn action_by_name(&self, name: &str) -> Option<Action> {
        self.map.get(name).map(|&code| Action(code))
    }
}

/// Frame sink that records everything it is handed.
pub struct RecordingSink {
    frames: Mutex<Vec<(u8, Vec<u8>)>>,
}

impl RecordingSink {
    pub fn new() -> RecordingSink {
        RecordingSink {
            frames: Mutex::new(Vec::new()),
        }
    }

    pub fn take(&self) -> Vec<(u8, Vec<u8>)> {
        mem::take(&mut *self.frames.lock().unwrap())
    }
}

impl FrameSink for RecordingSink {
    fn send(&self, opcode: u8, payload: &[u8]) {
        self.frames.lock().unwrap().push((opcode, payload.to_vec()));
    }
}

/// Courier that queues tasks until the test drains them, making races
/// against in-flight work deterministic.
pub struct StepCourier {
    tasks: Mutex<VecDeque<Task>>,
}

impl StepCourier {
    pub fn new() -> StepCourier {
        StepCourier {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    pub fn run_all(&self) {
        loop {
            let task = self.tasks.lock().unwrap().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }
}

impl Courier for StepCourier {
    fn dispatch(&self, task: Task) {
        self.tasks.lock().unwrap().push_back(task);
    }
}

/// Worker pool that holds tasks until the test runs them.
pub struct QueueRunner {
    tasks: Mutex<Vec<Task>>,
}

impl QueueRunner {
    pub fn new() -> QueueRunner {
        QueueRunner {
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn run_queued(&self) {
        let tasks = mem::take(&mut *self.tasks.lock().unwrap());
        for task in tasks {
            task();
        }
    }
}

impl TaskRunner for QueueRunner {
    fn run(&self, task: Task) {
        self.tasks.lock().unwrap().push(task);
    }
}

/// Loader returning a preset result, recording what was asked of it.
pub struct CannedLoader {
    result: Mutex<Option<Result<CodedImage, String>>>,
    urls: Mutex<Vec<String>>,
}

impl CannedLoader {
    pub fn new() -> CannedLoader {
        CannedLoader {
            result: Mutex::new(None),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_result(&self, result: Result<CodedImage, String>) {
        *self.result.lock().unwrap() = Some(result);
    }

    pub fn seen(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn sample_image(&self) -> CodedImage {
        CodedImage {
            width: 64,
            height: 48,
            flags: 0,
            color_planes: 1,
            coded_type: 1,
            orientation: 0,
            data: vec![0xff, 0xd8, 0xff],
        }
    }
}

impl ImageLoader for CannedLoader {
    fn load(
        &self,
        url: &str,
        _meta: &ImageMeta,
        _cancel: &Arc<Cancellable>,
    ) -> Result<CodedImage, String> {
        self.urls.lock().unwrap().push(url.to_string());
        self.result
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err("No canned image".to_string()))
    }
}

/// A fully wired session over mock collaborators.
pub struct Harness {
    pub tree: Arc<ScriptedTree>,
    pub loader: Arc<CannedLoader>,
    pub runner: Arc<QueueRunner>,
    pub courier: Arc<StepCourier>,
    pub sink: Arc<RecordingSink>,
    pub session: Arc<Mutex<Session>>,
}

impl Harness {
    pub fn input(&self, opcode: u8, data: &[u8]) -> crate::wire::FrameResult<()> {
        lock(&self.session).input(opcode, data)
    }
}

pub fn harness() -> Harness {
    let tree = Arc::new(ScriptedTree::new());
    let loader = Arc::new(CannedLoader::new());
    let runner = Arc::new(QueueRunner::new());
    let courier = Arc::new(StepCourier::new());
    let sink = Arc::new(RecordingSink::new());

    let env = Arc::new(Env {
        tree: tree.clone(),
        loader: loader.clone(),
        tasks: runner.clone(),
        courier: courier.clone(),
        actions: Arc::new(Actions::new(&[("Up", 1), ("Down", 2)])),
    });
    let session = Session::new(env, sink.clone(), None);

    Harness {
        tree,
        loader,
        runner,
        courier,
        sink,
        session,
    }
}
