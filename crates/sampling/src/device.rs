/// Execution path for the distance kernel.
///
/// Chosen once per run and passed explicitly; there is no process-wide
/// fallback state. Both paths produce bit-identical selections. The device
/// only affects wall-clock time, which matters because the kernel performs
/// O(N·K) distance evaluations per cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    Sequential,
    /// Spread kernel work across all rayon worker threads.
    #[default]
    Parallel,
}
