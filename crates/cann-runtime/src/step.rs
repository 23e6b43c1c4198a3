//! Neuron update kernel
//!
//! One call computes a neuron's next activation from the shared state and,
//! when its modulatory signal is non-zero, adjusts the neuron's incoming
//! weight row in the same pass. Activations are written back immediately,
//! so neurons later in a scan observe values already updated in the current
//! tick (Gauss–Seidel ordering).
//!
//! Barriered runs step each partition against a published view:
//! neurons of the partition itself are still read live, everything else is
//! read from the copy published at the end of the previous tick.

use crate::activation;
use crate::atomic::AtomicF32;
use crate::scheduler::Partition;
use crate::state::NetworkState;

/// Where a neuron reads the activations of other neurons from
#[derive(Debug, Clone, Copy)]
pub(crate) enum View<'a> {
    /// Every read sees the latest stored value
    Live,
    /// Neurons outside `own` are read from `published`
    Published {
        own: &'a [Partition],
        published: &'a [AtomicF32],
    },
}

impl View<'_> {
    #[inline]
    fn activation(&self, state: &NetworkState, j: usize) -> f32 {
        match self {
            View::Live => state.activation(j),
            View::Published { own, published } => {
                if own.iter().any(|p| p.contains(j)) {
                    state.activation(j)
                } else {
                    published.get(j).map_or(0.0, AtomicF32::load)
                }
            }
        }
    }
}

#[inline]
fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Modulatory signal `m` for neuron `i`
///
/// An out-of-range modulatory target reads as activation `0.0`.
#[inline]
pub fn modulation(state: &NetworkState, i: usize) -> f32 {
    modulation_in(state, i, View::Live)
}

#[inline]
fn modulation_in(state: &NetworkState, i: usize, view: View<'_>) -> f32 {
    view.activation(state, state.mod_target(i)) * state.mod_weight(i) * state.learning_rate()
}

/// Compute the next activation of neuron `i`
///
/// Applies the Hebbian update to row `i` as a side effect, but does not
/// store the returned activation. Out-of-range `i` yields `0.0`.
pub fn next_activation(state: &NetworkState, i: usize) -> f32 {
    next_activation_in(state, i, View::Live)
}

fn next_activation_in(state: &NetworkState, i: usize, view: View<'_>) -> f32 {
    if i < state.num_inputs() {
        return state.input(i);
    }
    let Some(row) = state.row(i) else {
        return 0.0;
    };

    let u = state.activation(i);
    let m = modulation_in(state, i, view);
    let mut o = 0.0f32;

    if m != 0.0 {
        let [g0, g1, g2, g3] = state.gammas(i);
        for (j, cell) in row.iter().enumerate() {
            let w = cell.load();
            let v = view.activation(state, j);
            o += w * v;
            let dw = sign(w) * m * (g0 * u * v + g1 * v + g2 * u + g3);
            cell.store(w + dw);
        }
    } else {
        for (j, cell) in row.iter().enumerate() {
            o += cell.load() * view.activation(state, j);
        }
    }

    activation::evaluate(state.activation_function_code(i), o, state.threshold(i))
}

/// Update neuron `i` in place
#[inline]
pub fn step_neuron(state: &NetworkState, i: usize) {
    step_neuron_in(state, i, View::Live);
}

#[inline]
fn step_neuron_in(state: &NetworkState, i: usize, view: View<'_>) {
    let value = next_activation_in(state, i, view);
    if let Some(cell) = state.activation_cell(i) {
        cell.store(value);
    }
}

/// Run one tick over every neuron of the given partitions, in order
pub(crate) fn tick(state: &NetworkState, partitions: &[Partition], view: View<'_>) {
    for partition in partitions {
        for i in partition.range() {
            step_neuron_in(state, i, view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;

    fn whole(state: &NetworkState) -> Vec<Partition> {
        vec![Partition::new(0, state.size())]
    }

    #[test]
    fn test_sign_of_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(2.0), 1.0);
        assert_eq!(sign(-2.0), -1.0);
    }

    #[test]
    fn test_input_neuron_takes_clamped_value() {
        let state = NetworkState::new(2, 1, 1);
        state.set_weight(0, 1, 5.0);
        state.set_inputs(&[0.3]).unwrap();
        assert_eq!(next_activation(&state, 0), 0.3);
    }

    #[test]
    fn test_propagation_threshold() {
        let state = NetworkState::new(3, 1, 1);
        state.set_weight(1, 0, 1.0);
        state.set_threshold(1, 0.5);
        state.set_threshold(2, 10.0);

        state.set_inputs(&[1.0]).unwrap();
        tick(&state, &whole(&state), View::Live);
        assert_eq!(state.activation(1), 1.0);

        state.set_inputs(&[0.4]).unwrap();
        tick(&state, &whole(&state), View::Live);
        assert_eq!(state.activation(1), 0.0);
    }

    #[test]
    fn test_gauss_seidel_ordering() {
        // 0 -> 1 -> 2 in one tick because writes are visible immediately
        let state = NetworkState::new(3, 1, 0);
        state.set_weight(1, 0, 1.0);
        state.set_weight(2, 1, 1.0);
        state.set_threshold(1, 0.5);
        state.set_threshold(2, 0.5);
        state.set_inputs(&[1.0]).unwrap();

        tick(&state, &whole(&state), View::Live);
        assert_eq!(state.activation(2), 1.0);
    }

    #[test]
    fn test_hebbian_update_uses_pre_update_weights() {
        let state = NetworkState::new(2, 1, 0);
        state.set_learning_rate(1.0);
        state.set_weight(1, 0, 0.5);
        state.set_weight(1, 1, -0.5);
        state.set_activation_function(1, ActivationFunction::Linear);
        state.set_gamma(1, 3, 0.1).unwrap();
        state.set_mod(1, 0, 1.0);
        state.set_activation(0, 1.0);
        state.set_activation(1, 0.0);
        state.set_inputs(&[1.0]).unwrap();

        let m = modulation(&state, 1);
        assert_eq!(m, 1.0);

        let out = next_activation(&state, 1);
        assert_eq!(out, 0.5);
        // dw = sign(w) * m * g3
        assert!((state.weight(1, 0) - 0.6).abs() < 1e-6);
        assert!((state.weight(1, 1) + 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_zero_weights_never_grow() {
        let state = NetworkState::new(2, 0, 0);
        state.set_learning_rate(1.0);
        state.set_gamma(1, 3, 1.0).unwrap();
        state.set_activation(0, 1.0);
        state.set_mod(1, 0, 1.0);

        next_activation(&state, 1);
        assert_eq!(state.weight(1, 0), 0.0);
    }

    #[test]
    fn test_no_plasticity_without_modulation() {
        let state = NetworkState::new(2, 0, 0);
        state.set_learning_rate(1.0);
        state.set_weight(1, 0, 0.5);
        state.set_gamma(1, 3, 1.0).unwrap();
        state.set_activation(0, 1.0);

        next_activation(&state, 1);
        assert_eq!(state.weight(1, 0), 0.5);
    }

    #[test]
    fn test_unknown_function_code_yields_zero() {
        let state = NetworkState::new(1, 0, 1);
        state.set_activation_function_code(0, 9);
        state.set_activation(0, 1.0);
        step_neuron(&state, 0);
        assert_eq!(state.activation(0), 0.0);
    }

    #[test]
    fn test_published_view_reads_other_partitions_from_copy() {
        // 0 -> 1 across a partition boundary
        let state = NetworkState::new(2, 0, 0);
        state.set_weight(1, 0, 1.0);
        state.set_threshold(1, 0.5);
        state.set_activation(0, 1.0);
        let published = crate::atomic::cells(2, 0.0);
        let own = [Partition::new(1, 2)];
        let view = View::Published {
            own: &own,
            published: &published,
        };

        tick(&state, &own, view);
        assert_eq!(state.activation(1), 0.0);

        published[0].store(1.0);
        tick(&state, &own, view);
        assert_eq!(state.activation(1), 1.0);
    }

    #[test]
    fn test_published_view_modulation() {
        let state = NetworkState::new(2, 0, 0);
        state.set_learning_rate(1.0);
        state.set_mod(1, 0, 1.0);
        state.set_activation(0, 1.0);
        let published = crate::atomic::cells(2, 0.25);
        let own = [Partition::new(1, 2)];
        let view = View::Published {
            own: &own,
            published: &published,
        };

        assert_eq!(modulation(&state, 1), 1.0);
        assert_eq!(modulation_in(&state, 1, view), 0.25);
    }

    #[test]
    fn test_out_of_range_neuron() {
        let state = NetworkState::new(1, 0, 0);
        assert_eq!(next_activation(&state, 3), 0.0);
        step_neuron(&state, 3);
    }
}
