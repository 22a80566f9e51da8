use anyhow::{ensure, Result};
use candle_core::{Tensor, D};

/// Average of the token states the mask keeps: `[B,T,H]` with a `[B,T]` mask
/// gives `[B,H]`. A row with no kept tokens pools to zeros.
pub fn masked_mean(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, _) = hidden.dims3()?;
    ensure!(
        attention_mask.dims() == [batch, tokens].as_slice(),
        "mask shape {:?} does not fit hidden states {:?}",
        attention_mask.dims(),
        hidden.dims()
    );
    let weights = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(D::Minus1)?;
    let summed = hidden.broadcast_mul(&weights)?.sum(1)?;
    let kept = weights.sum(1)?.affine(1.0, 1e-9)?;
    Ok(summed.broadcast_div(&kept)?)
}

/// Scale each row to unit length; zero rows stay zero.
pub fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    let norms = rows.sqr()?.sum_keepdim(D::Minus1)?.sqrt()?.affine(1.0, 1e-12)?;
    Ok(rows.broadcast_div(&norms)?)
}

/// Sentence-transformers pooling: masked mean, then unit length.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    l2_normalize(&masked_mean(hidden, attention_mask)?)
}
