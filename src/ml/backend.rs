// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// The device is chosen once, at the application boundary, and
// every generic training/inference function is instantiated for
// the matching backend:
//
//   cpu  → Autodiff<NdArray>  (inference: NdArray)
//   wgpu → Autodiff<Wgpu>     (inference: Wgpu)

use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};
use serde::{Deserialize, Serialize};

pub type CpuBackend      = Autodiff<NdArray>;
pub type CpuInferBackend = NdArray;
pub type GpuBackend      = Autodiff<Wgpu>;
pub type GpuInferBackend = Wgpu;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Cpu,
    Wgpu,
}

impl DeviceKind {
    pub fn cpu_device() -> NdArrayDevice {
        NdArrayDevice::Cpu
    }

    pub fn wgpu_device() -> WgpuDevice {
        WgpuDevice::default()
    }
}
