use crate::events::EventDecoder;
use crate::image;
use crate::registry::Registry;
use crate::sub::{Encoding, Subscription};
use crate::wire::binary::{self, Command, SetPayload};
use crate::wire::bytes::PropRef;
use crate::wire::{json, FrameError, FrameResult};
use indexmap::IndexMap;
use proptree::config;
use proptree::event::{ActionMap, PropEvent};
use proptree::image::ImageLoader;
use proptree::logging;
use proptree::sub::{Courier, PropTree, SubCallback, SubRequest, TaskRunner, SUB_ALT_PATH};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Websocket opcodes used by the endpoint.
pub const OPCODE_TEXT: u8 = 1;
pub const OPCODE_BINARY: u8 = 2;

/// Outbound frame queue of the transport. `send` is a non-blocking enqueue
/// on the connection's write queue.
pub trait FrameSink: Send + Sync {
    fn send(&self, opcode: u8, payload: &[u8]);
}

/// The collaborators one endpoint instance serves all its sessions with.
pub struct Env {
    pub tree: Arc<dyn PropTree>,
    pub loader: Arc<dyn ImageLoader>,
    pub tasks: Arc<dyn TaskRunner>,
    pub courier: Arc<dyn Courier>,
    pub actions: Arc<dyn ActionMap>,
}

/// State of one accepted websocket connection.
///
/// Sessions are driven entirely on the courier: transport input,
/// subscription callbacks and image continuations all arrive there, so the
/// mutex is uncontended and exists to carry the state across those entry
/// points. Binary traffic is gated behind the HELLO exchange; JSON traffic
/// has no hello and is accepted from the first frame.
pub struct Session {
    pub(crate) env: Arc<Env>,
    pub(crate) sink: Arc<dyn FrameSink>,
    pub(crate) subs: IndexMap<u32, Subscription>,
    pub(crate) registry: Registry,
    pub(crate) helloed: bool,
    pub(crate) imagereqs: Vec<Arc<image::ImageReq>>,
    pub(crate) self_ref: Weak<Mutex<Session>>,
    pub(crate) log: logging::Logger,
}

/// Lock a session, adopting the state of a panicked holder. Session state
/// is only ever touched from the courier, so contention is not expected.
pub fn lock(session: &Mutex<Session>) -> MutexGuard<Session> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Session {
    pub fn new<'a, L: Into<Option<&'a logging::Logger>>>(
        env: Arc<Env>,
        sink: Arc<dyn FrameSink>,
        log: L,
    ) -> Arc<Mutex<Session>> {
        let log = match log.into() {
            Some(log) => log.new(logging::o!()),
            None => logging::discard(),
        };
        let registry_log = log.new(logging::o!());

        let session = Arc::new_cyclic(|weak| {
            Mutex::new(Session {
                env,
                sink,
                subs: IndexMap::new(),
                registry: Registry::new(registry_log),
                helloed: false,
                imagereqs: Vec::new(),
                self_ref: weak.clone(),
                log,
            })
        });

        logging::debug!(lock(&session).log, "session opened"; "context" => "open");
        session
    }

    /// Feed one inbound frame. An `Err` is a protocol violation and the
    /// transport must drop the connection (and then call [`shutdown`]).
    ///
    /// [`shutdown`]: Session::shutdown
    pub fn input(&mut self, opcode: u8, data: &[u8]) -> FrameResult<()> {
        match opcode {
            OPCODE_TEXT => {
                self.input_json(data);
                Ok(())
            }
            OPCODE_BINARY => self.input_binary(data),
            _ => Ok(()),
        }
    }

    fn input_json(&mut self, data: &[u8]) {
        let text = String::from_utf8_lossy(data);
        match json::decode(&text) {
            json::Command::Subscribe { id, propref, path } => {
                self.cmd_subscribe(id, propref, 0, path, Vec::new(), Encoding::Json)
            }
            json::Command::Unsubscribe { id } => self.cmd_unsubscribe(id),
            json::Command::Set {
                propref,
                path,
                value,
            } => {
                let (path, value) = match (path, value) {
                    (Some(path), Some(value)) => (path, value),
                    _ => return,
                };
                let tree = self.env.tree.clone();
                let root = self.registry.resolve(tree.as_ref(), propref);
                tree.set_down(root.as_ref(), &path, value);
            }
            json::Command::Ignored => (),
        }
    }

    fn input_binary(&mut self, data: &[u8]) -> FrameResult<()> {
        let command = binary::decode(data)?;

        // HELLO is accepted at any time and answered in kind; everything
        // else waits for the gate to open.
        if let Command::Hello { version, flags } = &command {
            logging::debug!(self.log, "client hello";
                            "context" => "hello",
                            "version" => *version,
                            "flags" => *flags);
            self.sink
                .send(OPCODE_BINARY, &binary::hello(config::running_instance()));
            self.helloed = true;
            return Ok(());
        }
        if !self.helloed {
            return Err(FrameError::HelloRequired);
        }

        match command {
            Command::Hello { .. } => unreachable!("handled above"),
            Command::Subscribe {
                id,
                propref,
                flags,
                names,
            } => {
                self.cmd_subscribe(id, propref, flags, None, names, Encoding::Binary);
                Ok(())
            }
            Command::Unsubscribe { id } => {
                self.cmd_unsubscribe(id);
                Ok(())
            }
            Command::Set { target, value } => {
                self.cmd_set(target, value);
                Ok(())
            }
            Command::Event {
                target,
                event,
                payload,
            } => self.cmd_event(target, event, &payload),
            Command::ReqMove { id, before } => {
                let tree = self.env.tree.clone();
                let prop = self.registry.resolve(tree.as_ref(), id);
                let before = before
                    .filter(|&before| before != 0)
                    .and_then(|before| self.registry.resolve(tree.as_ref(), before));
                tree.req_move(prop.as_ref(), before.as_ref());
                Ok(())
            }
            Command::WantMoreChilds { id } => {
                if let Some(sub) = self.subs.get(&id) {
                    sub.handle.want_more_childs();
                }
                Ok(())
            }
            Command::Select { target } => {
                if let Some(target) = target {
                    let tree = self.env.tree.clone();
                    if let Some(prop) = self.registry.resolve_ref(tree.as_ref(), &target) {
                        tree.select(&prop);
                    }
                }
                Ok(())
            }
            Command::ImageLoad {
                id,
                flags,
                req_width,
                req_height,
                url,
            } => {
                image::start(self, id, flags, req_width, req_height, url);
                Ok(())
            }
            Command::ImageCancel { id } => {
                image::cancel(self, id);
                Ok(())
            }
        }
    }

    fn cmd_subscribe(
        &mut self,
        id: u32,
        propref: u32,
        flags: u16,
        path: Option<String>,
        names: Vec<String>,
        encoding: Encoding,
    ) {
        let tree = self.env.tree.clone();
        // An unresolvable starting point is fine; the subscription simply
        // sits on a null root.
        let root = self.registry.resolve(tree.as_ref(), propref);

        if self.subs.contains_key(&id) {
            logging::error!(self.log, "Subscription ID already exist";
                            "context" => "subscribe", "sub_id" => id);
            return;
        }

        let handle = tree.subscribe(SubRequest {
            flags: SUB_ALT_PATH | flags,
            root,
            path,
            names,
            callback: self.make_callback(id),
            courier: self.env.courier.clone(),
        });

        logging::debug!(self.log, "subscription installed";
                        "context" => "subscribe",
                        "sub_id" => id,
                        "propref" => propref);

        self.subs.insert(id, Subscription::new(id, encoding, handle));
    }

    fn make_callback(&self, sub_id: u32) -> SubCallback {
        let weak = self.self_ref.clone();
        Box::new(move |event| {
            if let Some(session) = weak.upgrade() {
                lock(&session).sub_event(sub_id, event);
            }
        })
    }

    /// Tree delivery for one subscription: translate, encode, enqueue.
    pub(crate) fn sub_event(&mut self, sub_id: u32, event: PropEvent) {
        let Session {
            subs,
            registry,
            sink,
            log,
            ..
        } = self;

        let sub = match subs.get_mut(&sub_id) {
            Some(sub) => sub,
            // Released while the delivery was queued.
            None => return,
        };

        let notify = match crate::sub::translate(sub, registry, event, log) {
            Some(notify) => notify,
            None => return,
        };

        match sub.encoding {
            Encoding::Binary => sink.send(OPCODE_BINARY, &binary::notify(sub_id, &notify)),
            Encoding::Json => {
                if let Some(frame) = json::notify(sub_id, &notify) {
                    sink.send(OPCODE_TEXT, frame.as_bytes());
                }
            }
        }
    }

    fn cmd_unsubscribe(&mut self, id: u32) {
        self.destroy_sub(id);
    }

    fn destroy_sub(&mut self, id: u32) {
        let mut sub = match self.subs.swap_remove(&id) {
            Some(sub) => sub,
            None => return,
        };
        sub.clear_all(&mut self.registry);
        // Dropping the subscription releases the tree handle.
    }

    fn cmd_set(&mut self, target: Option<PropRef>, value: SetPayload) {
        let target = match target {
            Some(target) => target,
            None => return,
        };
        let tree = self.env.tree.clone();
        let prop = match self.registry.resolve_ref(tree.as_ref(), &target) {
            Some(prop) => prop,
            None => return,
        };

        match value {
            SetPayload::Str { hint, value } => tree.set_string(&prop, &value, hint),
            SetPayload::Int(value) => tree.set_int(&prop, value),
            SetPayload::Float(value) => tree.set_float(&prop, value),
            SetPayload::Void => tree.set_void(&prop),
            SetPayload::Toggle => tree.toggle_int(&prop),
            SetPayload::Ignored => (),
        }
    }

    fn cmd_event(&mut self, target: PropRef, event: u8, payload: &[u8]) -> FrameResult<()> {
        let tree = self.env.tree.clone();
        let prop = match self.registry.resolve_ref(tree.as_ref(), &target) {
            Some(prop) => prop,
            None => return Err(FrameError::BadReference),
        };

        let user_event = {
            let decoder = EventDecoder {
                registry: &self.registry,
                tree: tree.as_ref(),
                actions: self.env.actions.as_ref(),
                log: &self.log,
            };
            decoder.decode(event, payload)
        };

        if let Some(user_event) = user_event {
            tree.send_event(&prop, user_event);
        }
        Ok(())
    }

    /// Connection teardown. Destroys every subscription (which unexports
    /// all issued ids) and orphans in-flight image requests; their worker
    /// tasks run to completion and discard their results.
    pub fn shutdown(&mut self) {
        logging::debug!(self.log, "session teardown";
                        "context" => "shutdown",
                        "subscriptions" => self.subs.len(),
                        "exported" => self.registry.len(),
                        "imagereqs" => self.imagereqs.len());

        let ids: Vec<u32> = self.subs.keys().copied().collect();
        for id in ids {
            self.destroy_sub(id);
        }
        assert!(
            self.registry.is_empty(),
            "Exported ids leaked at teardown"
        );

        self.imagereqs.clear();
    }
}
