use candle_core::{DType, Device, Tensor};
use receipt_embed::masked_mean_l2;

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "got {actual:?}, want {expected:?}");
    }
}

#[test]
fn padding_tokens_do_not_move_the_sentence_vector() {
    let dev = Device::Cpu;
    // Row 0: tokens [3,0] and [1,4], then padding. Row 1: one token, then two pads.
    let hidden = Tensor::from_slice(
        &[3.0f32, 0.0, 1.0, 4.0, 100.0, 100.0, 0.0, 2.0, 9.0, 9.0, -9.0, 9.0],
        (2, 3, 2),
        &dev,
    )
    .expect("hidden");
    let mask = Tensor::from_slice(&[1u32, 1, 0, 1, 0, 0], (2, 3), &dev).expect("mask");

    let pooled: Vec<Vec<f32>> = masked_mean_l2(&hidden, &mask).expect("pool").to_vec2().expect("vec");
    // Row 0 mean is [2,2]; row 1 is [0,2].
    let half = 1.0 / 2.0f32.sqrt();
    assert_close(&pooled[0], &[half, half]);
    assert_close(&pooled[1], &[0.0, 1.0]);
}

#[test]
fn fully_masked_row_pools_to_zeros() {
    let dev = Device::Cpu;
    let hidden = Tensor::ones((1, 2, 3), DType::F32, &dev).expect("hidden");
    let mask = Tensor::zeros((1, 2), DType::U32, &dev).expect("mask");
    let pooled: Vec<Vec<f32>> = masked_mean_l2(&hidden, &mask).expect("pool").to_vec2().expect("vec");
    assert_close(&pooled[0], &[0.0, 0.0, 0.0]);
}

#[test]
fn rejects_flat_input_and_mismatched_masks() {
    let dev = Device::Cpu;
    let flat = Tensor::zeros((2, 4), DType::F32, &dev).expect("flat");
    let mask = Tensor::ones((1, 2), DType::F32, &dev).expect("mask");
    assert!(masked_mean_l2(&flat, &mask).is_err());

    let hidden = Tensor::zeros((1, 3, 4), DType::F32, &dev).expect("hidden");
    assert!(masked_mean_l2(&hidden, &mask).is_err());
}
