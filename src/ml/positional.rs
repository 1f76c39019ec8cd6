use burn::prelude::*;

/// Fixed sinusoidal position table of shape [max_len, d_model].
///
/// Channel `c` at position `pos` uses pair index `i = c / 2`:
/// `angle = pos / 10000^(2i / d_model)`, `sin` on even channels,
/// `cos` on odd ones. Computed once on the host, never trained.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalEncoding {
    table:   Vec<f32>,
    max_len: usize,
    d_model: usize,
}

impl PositionalEncoding {
    pub fn new(max_len: usize, d_model: usize) -> Self {
        let mut table = Vec::with_capacity(max_len * d_model);
        for pos in 0..max_len {
            for c in 0..d_model {
                let pair  = (c / 2) as f64;
                let angle = pos as f64 / 10000f64.powf(2.0 * pair / d_model as f64);
                let value = if c % 2 == 0 { angle.sin() } else { angle.cos() };
                table.push(value as f32);
            }
        }
        Self { table, max_len, d_model }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Value at (pos, channel).
    pub fn get(&self, pos: usize, channel: usize) -> Option<f32> {
        if pos >= self.max_len || channel >= self.d_model {
            return None;
        }
        Some(self.table[pos * self.d_model + channel])
    }

    /// Add the first `seq` rows of the table to `x: [batch, seq, d_model]`.
    /// Callers guarantee `seq <= max_len`.
    pub fn forward<B: Backend>(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq, d_model] = x.dims();
        let rows = &self.table[..seq * d_model];
        let pe = Tensor::<B, 1>::from_floats(rows, &x.device())
            .reshape([1, seq, d_model])
            .expand([batch, seq, d_model]);
        x + pe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_known_values() {
        let pe = PositionalEncoding::new(10, 4);
        // pos 0: sin(0) = 0, cos(0) = 1
        assert_eq!(pe.get(0, 0), Some(0.0));
        assert_eq!(pe.get(0, 1), Some(1.0));
        // pos 1, channel 0: sin(1)
        assert!((pe.get(1, 0).unwrap() - 1f32.sin()).abs() < 1e-6);
        // pos 1, channel 3: pair 1 → cos(1 / 10000^(2/4)) = cos(0.01)
        assert!((pe.get(1, 3).unwrap() - 0.01f32.cos()).abs() < 1e-6);
        assert_eq!(pe.get(10, 0), None);
    }

    #[test]
    fn test_odd_width() {
        let pe = PositionalEncoding::new(3, 5);
        // last channel is even → sin
        assert!((pe.get(2, 4).unwrap() - (2.0 / 10000f64.powf(4.0 / 5.0)).sin() as f32).abs() < 1e-6);
    }

    #[test]
    fn test_forward_adds_truncated_table() {
        let device = Default::default();
        let pe = PositionalEncoding::new(8, 4);
        let x  = Tensor::<NdArray, 3>::zeros([2, 3, 4], &device);
        let y  = pe.forward(x);
        assert_eq!(y.dims(), [2, 3, 4]);

        let values = y.into_data().to_vec::<f32>().unwrap();
        // second batch row repeats the first
        assert_eq!(values[..12], values[12..]);
        assert_eq!(values[5], pe.get(1, 1).unwrap());
    }
}
