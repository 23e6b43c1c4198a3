use cann_runtime::{
    ActivationFunction, Consistency, IdleStrategy, Network, NetworkConfig, Partition,
};
use proptest::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn network(size: usize, inputs: usize, outputs: usize, workers: usize) -> Network {
    init_logging();
    Network::new(NetworkConfig::new(size, inputs, outputs).with_workers(workers))
        .expect("valid network")
}

#[test]
fn three_neuron_threshold_example() {
    let mut net = network(3, 1, 1, 1);
    net.set_weight(1, 0, 1.0);
    net.set_threshold(1, 0.5);
    net.set_activation_function(1, ActivationFunction::Step);

    net.set_inputs(&[1.0]).unwrap();
    net.run(1);
    assert_eq!(net.activation(1), 1.0);

    net.set_inputs(&[0.4]).unwrap();
    net.run(1);
    assert_eq!(net.activation(1), 0.0);
}

#[test]
fn zero_network_responds_to_zero_input() {
    let mut net = network(6, 2, 2, 1);
    net.set_threshold(3, 0.5);
    net.set_activation_function(4, ActivationFunction::ExpSigmoid);
    net.set_activation_function(5, ActivationFunction::Linear);
    net.set_inputs(&[0.0, 0.0]).unwrap();
    net.run(1);

    assert_eq!(net.activation(2), 1.0);
    assert_eq!(net.activation(3), 0.0);
    assert!((net.activation(4) - 0.5).abs() < 1e-6);
    assert_eq!(net.activation(5), 0.0);
}

#[test]
fn single_worker_runs_are_deterministic() {
    let build = || {
        let mut net = network(16, 2, 4, 1);
        for i in 0..16 {
            net.set_activation_function(i, ActivationFunction::ExpSigmoid);
            net.set_threshold(i, 0.1 * (i % 3) as f32);
            for j in 0..16 {
                net.set_weight(i, j, ((i * 7 + j * 3) % 11) as f32 / 11.0 - 0.5);
            }
        }
        net.set_inputs(&[1.0, 0.25]).unwrap();
        net
    };

    let mut a = build();
    let mut b = build();
    let mut trace_a = Vec::new();
    let mut trace_b = Vec::new();
    for _ in 0..5 {
        a.run(3);
        b.run(3);
        trace_a.push(a.activations());
        trace_b.push(b.activations());
    }
    assert_eq!(trace_a, trace_b);
}

#[test]
fn no_weight_change_without_learning_rate() {
    let mut net = network(8, 1, 1, 1);
    for i in 0..8 {
        net.set_gammas(i, [1.0, 1.0, 1.0, 1.0]);
        net.set_mod(i, 0, 1.0);
        for j in 0..8 {
            net.set_weight(i, j, 0.3);
        }
    }
    let before = net.snapshot().weights;
    net.set_inputs(&[1.0]).unwrap();
    net.run(10);
    assert_eq!(net.snapshot().weights, before);
}

/// Weight matrix whose blocks match the partition layout exactly
fn block_diagonal(net: &mut Network, partitions: &[Partition]) {
    for p in partitions {
        for i in p.range() {
            net.set_activation_function(i, ActivationFunction::ExpSigmoid);
            net.set_threshold(i, 0.2);
            for j in p.range() {
                let w = ((i * 13 + j * 5) % 9) as f32 / 9.0 - 0.4;
                net.set_weight(i, j, w);
            }
        }
    }
}

fn partition_invariance(consistency: Consistency, idle: IdleStrategy) {
    let size = 23;
    let workers = 4;
    let layout = cann_runtime::partition_ranges(size, workers);

    let mut single = network(size, 0, size, 1);
    let mut multi = Network::new(
        NetworkConfig::new(size, 0, size)
            .with_workers(workers)
            .with_consistency(consistency)
            .with_idle(idle),
    )
    .unwrap();
    assert_eq!(multi.partitions(), layout);

    block_diagonal(&mut single, &layout);
    block_diagonal(&mut multi, &layout);
    for i in 0..size {
        single.set_activation(i, (i % 2) as f32);
        multi.set_activation(i, (i % 2) as f32);
    }

    single.run(7);
    multi.run(7);
    assert_eq!(single.activations(), multi.activations());

    single.run(1);
    multi.run(1);
    assert_eq!(single.activations(), multi.activations());
}

#[test]
fn partition_count_invariance_relaxed() {
    partition_invariance(Consistency::Relaxed, IdleStrategy::Yield);
}

#[test]
fn partition_count_invariance_barriered_park() {
    partition_invariance(Consistency::Barriered, IdleStrategy::Park);
}

fn bits(values: &[f32]) -> Vec<u32> {
    values.iter().map(|v| v.to_bits()).collect()
}

/// Dense network where every neuron reads and modulates across partitions
fn dense_barriered(idle: IdleStrategy) -> Network {
    init_logging();
    let size = 96;
    let mut net = Network::new(
        NetworkConfig::new(size, 4, 8)
            .with_workers(4)
            .with_consistency(Consistency::Barriered)
            .with_idle(idle),
    )
    .unwrap();
    assert_eq!(net.scheduler().worker_count(), 4);

    net.set_learning_rate(0.05);
    for i in 0..size {
        net.set_activation_function(i, ActivationFunction::ExpSigmoid);
        net.set_threshold(i, ((i * 17) % 7) as f32 / 7.0 - 0.5);
        net.set_gammas(i, [0.1, -0.05, 0.02, 0.01]);
        net.set_mod(i, (i * 31 + 11) % size, 1.0);
        net.set_activation(i, ((i * 29) % 13) as f32 / 13.0);
        for j in 0..size {
            net.set_weight(i, j, ((i * 37 + j * 19) % 23) as f32 / 23.0 - 0.45);
        }
    }
    net.set_inputs(&[1.0, 0.0, 0.5, 0.75]).unwrap();
    net
}

fn barriered_runs_repeat(idle: IdleStrategy) {
    let trace = |mut net: Network| {
        let mut activations = Vec::new();
        for _ in 0..5 {
            net.run(2);
            activations.push(bits(&net.activations()));
        }
        (activations, bits(&net.snapshot().weights))
    };

    let first = trace(dense_barriered(idle));
    for _ in 0..5 {
        assert_eq!(trace(dense_barriered(idle)), first);
    }
}

#[test]
fn barriered_runs_are_bit_identical_yield() {
    barriered_runs_repeat(IdleStrategy::Yield);
}

#[test]
fn barriered_runs_are_bit_identical_park() {
    barriered_runs_repeat(IdleStrategy::Park);
}

#[test]
fn plasticity_is_local_to_partition() {
    let size = 12;
    let layout = cann_runtime::partition_ranges(size, 3);
    let build = |workers| {
        let mut net = network(size, 0, 0, workers);
        net.set_learning_rate(0.5);
        block_diagonal(&mut net, &layout);
        for p in &layout {
            for i in p.range() {
                net.set_gammas(i, [0.1, 0.0, 0.0, 0.01]);
                net.set_mod(i, p.start, 1.0);
                net.set_activation(i, 1.0);
            }
        }
        net
    };

    let mut single = build(1);
    let mut multi = build(3);
    single.run(4);
    multi.run(4);
    assert_eq!(single.snapshot().weights, multi.snapshot().weights);
    assert_eq!(single.activations(), multi.activations());
}

#[test]
fn overlapping_io_ranges_are_allowed() {
    let mut net = network(2, 2, 2, 1);
    net.set_inputs(&[0.3, 0.7]).unwrap();
    net.run(1);
    assert_eq!(net.outputs(), vec![0.3, 0.7]);
}

proptest! {
    #[test]
    fn weight_set_get_and_clamp(i in 0usize..12, j in 0usize..12, v in -10.0f32..10.0) {
        let mut net = network(6, 0, 0, 1);
        let before = net.snapshot();
        net.set_weight(i, j, v);
        if i < 6 && j < 6 {
            prop_assert_eq!(net.weight(i, j), v);
        } else {
            prop_assert_eq!(net.weight(i, j), 0.0);
            prop_assert_eq!(net.snapshot(), before);
        }
    }

    #[test]
    fn neuron_accessors_clamp(i in 0usize..16, v in -10.0f32..10.0) {
        let mut net = network(8, 0, 0, 1);
        net.set_threshold(i, v);
        net.set_activation(i, v);
        if i < 8 {
            prop_assert_eq!(net.threshold(i), v);
            prop_assert_eq!(net.activation(i), v);
        } else {
            prop_assert_eq!(net.threshold(i), 0.0);
            prop_assert_eq!(net.activation(i), 0.0);
        }
    }

    #[test]
    fn kernel_output_stays_in_unit_range(
        weights in proptest::collection::vec(-4.0f32..4.0, 25),
        thresholds in proptest::collection::vec(-1.0f32..1.0, 5),
        code in 0u8..4,
    ) {
        let mut net = network(5, 0, 5, 1);
        for i in 0..5 {
            net.set_threshold(i, thresholds[i]);
            net.set_activation_function(i, ActivationFunction::from_code(code).unwrap());
            for j in 0..5 {
                net.set_weight(i, j, weights[i * 5 + j]);
            }
        }
        net.run(3);
        prop_assert!(net.outputs().iter().all(|a| (0.0..=1.0).contains(a)));
    }
}
