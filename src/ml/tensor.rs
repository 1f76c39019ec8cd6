// ============================================================
// Layer 5 — Rank-Dynamic Tensor
// ============================================================
// Burn tensors carry their rank in the type (`Tensor<B, 3>`).
// A model assembled from a runtime list of layers cannot know
// the rank between two layers at compile time: a Flatten turns
// rank 4 into rank 2, a Conv2d needs rank 4, Linear takes any.
//
// DynTensor wraps ranks 1..=5 in one enum. Layers that work on
// any rank go through `map_rank!`; layers that need a specific
// rank ask for it with `into_rank3()` etc. and get a reason
// string back when the rank is wrong.

use burn::prelude::*;

#[derive(Debug, Clone)]
pub enum DynTensor<B: Backend> {
    R1(Tensor<B, 1>),
    R2(Tensor<B, 2>),
    R3(Tensor<B, 3>),
    R4(Tensor<B, 4>),
    R5(Tensor<B, 5>),
}

/// Apply a rank-generic expression to whatever rank `$x` holds.
macro_rules! map_rank {
    ($x:expr, $t:ident => $body:expr) => {
        match $x {
            $crate::ml::tensor::DynTensor::R1($t) => $crate::ml::tensor::DynTensor::R1($body),
            $crate::ml::tensor::DynTensor::R2($t) => $crate::ml::tensor::DynTensor::R2($body),
            $crate::ml::tensor::DynTensor::R3($t) => $crate::ml::tensor::DynTensor::R3($body),
            $crate::ml::tensor::DynTensor::R4($t) => $crate::ml::tensor::DynTensor::R4($body),
            $crate::ml::tensor::DynTensor::R5($t) => $crate::ml::tensor::DynTensor::R5($body),
        }
    };
}
pub(crate) use map_rank;

macro_rules! into_rank {
    ($name:ident, $variant:ident, $rank:literal) => {
        pub fn $name(self) -> Result<Tensor<B, $rank>, String> {
            match self {
                DynTensor::$variant(t) => Ok(t),
                other => Err(format!(
                    "expected a rank-{} input, got rank {} {:?}",
                    $rank,
                    other.rank(),
                    other.dims()
                )),
            }
        }
    };
}

impl<B: Backend> DynTensor<B> {
    pub fn rank(&self) -> usize {
        match self {
            DynTensor::R1(_) => 1,
            DynTensor::R2(_) => 2,
            DynTensor::R3(_) => 3,
            DynTensor::R4(_) => 4,
            DynTensor::R5(_) => 5,
        }
    }

    pub fn dims(&self) -> Vec<usize> {
        match self {
            DynTensor::R1(t) => t.dims().to_vec(),
            DynTensor::R2(t) => t.dims().to_vec(),
            DynTensor::R3(t) => t.dims().to_vec(),
            DynTensor::R4(t) => t.dims().to_vec(),
            DynTensor::R5(t) => t.dims().to_vec(),
        }
    }

    /// Size of the last dimension.
    pub fn last_dim(&self) -> usize {
        self.dims().last().copied().unwrap_or(0)
    }

    /// View the same elements under a new shape of rank 1..=5.
    /// Returns the reason when the shape is unreachable.
    pub fn reshape(self, dims: &[usize]) -> Result<Self, String> {
        let from = self.dims();
        let have: usize = from.iter().product();
        let want: usize = dims.iter().product();
        if have != want {
            return Err(format!("cannot view {:?} as {:?}", from, dims));
        }

        let flat = self.into_flat();
        Ok(match *dims {
            [a]                => DynTensor::R1(flat.reshape([a])),
            [a, b]             => DynTensor::R2(flat.reshape([a, b])),
            [a, b, c]          => DynTensor::R3(flat.reshape([a, b, c])),
            [a, b, c, d]       => DynTensor::R4(flat.reshape([a, b, c, d])),
            [a, b, c, d, e]    => DynTensor::R5(flat.reshape([a, b, c, d, e])),
            _ => return Err(format!("rank {} is not supported", dims.len())),
        })
    }

    fn into_flat(self) -> Tensor<B, 1> {
        match self {
            DynTensor::R1(t) => t,
            DynTensor::R2(t) => t.flatten(0, 1),
            DynTensor::R3(t) => t.flatten(0, 2),
            DynTensor::R4(t) => t.flatten(0, 3),
            DynTensor::R5(t) => t.flatten(0, 4),
        }
    }

    into_rank!(into_rank2, R2, 2);
    into_rank!(into_rank3, R3, 3);
    into_rank!(into_rank4, R4, 4);
    into_rank!(into_rank5, R5, 5);
}

impl<B: Backend> From<Tensor<B, 2>> for DynTensor<B> {
    fn from(t: Tensor<B, 2>) -> Self {
        DynTensor::R2(t)
    }
}

impl<B: Backend> From<Tensor<B, 3>> for DynTensor<B> {
    fn from(t: Tensor<B, 3>) -> Self {
        DynTensor::R3(t)
    }
}

impl<B: Backend> From<Tensor<B, 4>> for DynTensor<B> {
    fn from(t: Tensor<B, 4>) -> Self {
        DynTensor::R4(t)
    }
}

impl<B: Backend> From<Tensor<B, 5>> for DynTensor<B> {
    fn from(t: Tensor<B, 5>) -> Self {
        DynTensor::R5(t)
    }
}
