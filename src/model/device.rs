use candle_core::Device;
use tracing::{info, warn};

/// GPU backends a build can be compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accelerator {
    Metal,
    Cuda,
}

impl Accelerator {
    /// Backends compiled into this build, in probe order.
    pub fn compiled() -> Vec<Accelerator> {
        let mut found = Vec::new();
        if cfg!(feature = "metal") {
            found.push(Accelerator::Metal);
        }
        if cfg!(feature = "cuda") {
            found.push(Accelerator::Cuda);
        }
        found
    }

    fn open(self) -> candle_core::Result<Device> {
        match self {
            Accelerator::Metal => Device::new_metal(0),
            Accelerator::Cuda => Device::new_cuda(0),
        }
    }
}

/// Picks the first usable accelerator for the classifier, else the CPU.
pub fn select_device() -> Device {
    let compiled = Accelerator::compiled();
    let mut failures = Vec::with_capacity(compiled.len());

    for accelerator in compiled {
        match accelerator.open() {
            Ok(device) => {
                info!(?accelerator, "Classifier inference on GPU");
                return device;
            }
            Err(e) => {
                warn!(?accelerator, error = %e, "Accelerator unavailable");
                failures.push(format!("{accelerator:?}: {e}"));
            }
        }
    }

    let reason = if failures.is_empty() {
        "no GPU backend compiled".to_string()
    } else {
        failures.join("; ")
    };
    warn!(reason = %reason, "Classifier inference on CPU");
    Device::Cpu
}
