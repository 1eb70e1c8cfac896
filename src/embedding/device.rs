use candle_core::Device;
use tracing::{debug, warn};

/// Picks the first accelerator compiled in and available, else the CPU.
///
/// Embedding is a side path here (similarity lookups and the confidence pass),
/// so an unavailable GPU is logged and never an error.
pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                tracing::info!("Embedding on Metal");
                return device;
            }
            Err(e) => warn!(error = %e, "Metal unavailable"),
        }
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                tracing::info!("Embedding on CUDA");
                return device;
            }
            Err(e) => warn!(error = %e, "CUDA unavailable"),
        }
    }

    if cfg!(any(feature = "metal", feature = "cuda")) {
        warn!("Falling back to CPU for embeddings");
    } else {
        debug!("No GPU backend compiled, embedding on CPU");
    }
    Device::Cpu
}
