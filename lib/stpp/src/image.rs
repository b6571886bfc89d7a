use crate::session::{lock, Session, OPCODE_BINARY};
use crate::wire::binary;
use proptree::image::{Cancellable, CodedImage, ImageMeta};
use proptree::logging;
use std::sync::Arc;

/// An outstanding image load. Shared between the session (which owns the
/// listing) and the worker task (which owns the fetch); whichever side
/// finishes last drops the record.
pub struct ImageReq {
    pub id: u32,
    pub url: String,
    pub req_width: u32,
    pub req_height: u32,
    pub flags: u32,
    pub cancel: Arc<Cancellable>,
}

impl ImageReq {
    fn meta(&self) -> ImageMeta {
        ImageMeta {
            req_width: self.req_width,
            req_height: self.req_height,
            want_thumb: self.flags & 0x01 != 0,
            no_decoding: true,
        }
    }
}

/// Register the request and hand the fetch to the worker pool. Completion
/// comes back through the session courier.
pub fn start(session: &mut Session, id: u32, flags: u32, req_width: u32, req_height: u32, url: String) {
    let req = Arc::new(ImageReq {
        id,
        url,
        req_width,
        req_height,
        flags,
        cancel: Arc::new(Cancellable::new()),
    });
    session.imagereqs.insert(0, req.clone());

    logging::debug!(session.log, "image load scheduled";
                    "context" => "image",
                    "req_id" => id,
                    "url" => req.url.as_str());

    let env = session.env.clone();
    let weak = session.self_ref.clone();
    session.env.tasks.run(Box::new(move || {
        let result = env.loader.load(&req.url, &req.meta(), &req.cancel);
        env.courier.dispatch(Box::new(move || {
            if let Some(session) = weak.upgrade() {
                finish(&mut lock(&session), &req, result);
            }
        }));
    }));
}

/// Session-side continuation of a finished load. A request that is no
/// longer listed belongs to a torn-down session; its result is discarded.
pub fn finish(session: &mut Session, req: &Arc<ImageReq>, result: Result<CodedImage, String>) {
    let position = session
        .imagereqs
        .iter()
        .position(|listed| Arc::ptr_eq(listed, req));
    let position = match position {
        Some(position) => position,
        None => {
            logging::debug!(session.log, "image reply for reaped request";
                            "context" => "image", "req_id" => req.id);
            return;
        }
    };
    session.imagereqs.remove(position);

    if req.cancel.is_cancelled() {
        return;
    }

    match result {
        Ok(image) => session
            .sink
            .send(OPCODE_BINARY, &binary::image_reply(req.id, &image)),
        Err(error) => {
            logging::warn!(session.log, "image load failed";
                           "context" => "image",
                           "req_id" => req.id,
                           "error" => error.as_str());
            session
                .sink
                .send(OPCODE_BINARY, &binary::image_fail(req.id, &error));
        }
    }
}

/// Flip the cancellation token of every request carrying `id`. The request
/// stays listed; removal is the continuation's job.
pub fn cancel(session: &mut Session, id: u32) {
    for req in &session.imagereqs {
        if req.id == id {
            req.cancel.cancel();
        }
    }
}
