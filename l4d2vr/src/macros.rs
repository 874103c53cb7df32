/// Runs a block and reports how long it took at trace level
#[macro_export]
macro_rules! profile {
    ($description:expr, $block:expr) => {{
        let start = ::std::time::Instant::now();
        let result = $block;
        let duration = start.elapsed();
        ::tracing::trace!("[{}]: Time elapsed: {:?}", $description, duration);
        result
    }};
}
