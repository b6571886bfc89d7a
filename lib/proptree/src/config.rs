use lazy_static::lazy_static;

lazy_static! {
    static ref RUNNING_INSTANCE: [u8; 16] = rand::random();
}

/// The process-wide instance identifier. Generated once per boot and echoed
/// in every protocol handshake so clients can detect backend restarts.
#[inline]
pub fn running_instance() -> &'static [u8; 16] {
    &RUNNING_INSTANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_instance_is_stable() {
        assert_eq!(running_instance(), running_instance());
    }
}
