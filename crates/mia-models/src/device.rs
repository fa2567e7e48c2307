//! Compute device for target, shadow, and attack models.
//!
//! Every model of one experiment runs on the same device, and that device is
//! seeded once from the experiment seed before the first model is built, so
//! weight initialisation follows the seed wherever the backend allows it.

use candle_core::Device;

/// Pick the accelerator the crate was built for, else the CPU.
///
/// CUDA is tried under the `cuda` feature, then Metal under `metal`.
pub fn select_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                tracing::info!("training on CUDA device 0");
                return device;
            }
            Err(e) => tracing::warn!("CUDA unavailable, trying next backend: {e}"),
        }
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                tracing::info!("training on Metal device 0");
                return device;
            }
            Err(e) => tracing::warn!("Metal unavailable, trying next backend: {e}"),
        }
    }

    tracing::debug!("training on CPU");
    Device::Cpu
}

/// Seed the device RNG used for weight initialisation.
///
/// The CPU backend draws initial weights from the thread RNG and refuses an
/// explicit seed, so a failure here is logged and otherwise ignored.
pub fn seed_device(device: &Device, seed: u64) {
    if let Err(e) = device.set_seed(seed) {
        tracing::debug!(seed, "device RNG not seedable: {e}");
    }
}

/// [`select_device`] followed by [`seed_device`].
pub fn select_seeded_device(seed: u64) -> Device {
    let device = select_device();
    seed_device(&device, seed);
    device
}
