use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation token. The requester flips it, the worker polls
/// it and bails out early.
pub struct Cancellable {
    cancelled: AtomicBool,
}

impl Cancellable {
    #[inline]
    pub fn new() -> Cancellable {
        Cancellable {
            cancelled: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Load parameters forwarded to the image backend.
pub struct ImageMeta {
    pub req_width: u32,
    pub req_height: u32,
    pub want_thumb: bool,
    pub no_decoding: bool,
}

/// An image in its coded (undecoded) form: one coded component plus the
/// header fields a client needs to decode it on its side.
pub struct CodedImage {
    pub width: u16,
    pub height: u16,
    pub flags: u16,
    pub color_planes: u8,
    pub coded_type: u8,
    pub orientation: u8,
    pub data: Vec<u8>,
}

/// Blocking image fetch + probe. Runs on a worker task, never on a courier.
pub trait ImageLoader: Send + Sync {
    fn load(
        &self,
        url: &str,
        meta: &ImageMeta,
        cancel: &std::sync::Arc<Cancellable>,
    ) -> Result<CodedImage, String>;
}
