//! Flat C functions over an opaque network handle
//!
//! Conventions:
//! - Functions returning `i32` return [`CANN_OK`] on success and
//!   [`CANN_ERROR`] on failure.
//! - A null handle is ignored by setters and yields `0` from getters.
//! - Out-of-range neuron indices follow the runtime's clamp policy.
//! - Recoverable failures are written to a process-wide message slot read
//!   with [`cann_get_error`]. The last writer wins.

#![allow(clippy::not_unsafe_ptr_arg_deref)]

use cann_runtime::{Network, NetworkConfig, SchedulerConfig};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::ffi::{c_char, CStr, CString};
use std::fmt::Display;
use std::path::PathBuf;
use std::ptr;

/// Success
pub const CANN_OK: i32 = 0;
/// Failure; see [`cann_get_error`]
pub const CANN_ERROR: i32 = -1;

/// Opaque network handle
pub struct CannNetwork {
    inner: Network,
}

static LAST_ERROR: Lazy<Mutex<Option<CString>>> = Lazy::new(|| Mutex::new(None));

fn set_error(message: impl Display) {
    let text = message.to_string();
    log::warn!("{}", text);
    // interior NULs cannot cross the C boundary
    let text = text.replace('\0', " ");
    *LAST_ERROR.lock() = CString::new(text).ok();
}

fn network<'a>(net: *const CannNetwork) -> Option<&'a Network> {
    unsafe { net.as_ref() }.map(|n| &n.inner)
}

fn network_mut<'a>(net: *mut CannNetwork) -> Option<&'a mut Network> {
    unsafe { net.as_mut() }.map(|n| &mut n.inner)
}

fn path_arg(path: *const c_char) -> Option<PathBuf> {
    if path.is_null() {
        set_error("null path");
        return None;
    }
    match unsafe { CStr::from_ptr(path) }.to_str() {
        Ok(s) => Some(PathBuf::from(s)),
        Err(e) => {
            set_error(format!("path is not valid UTF-8: {}", e));
            None
        }
    }
}

fn scheduler(num_threads: u32) -> SchedulerConfig {
    SchedulerConfig {
        workers: num_threads.max(1) as usize,
        ..SchedulerConfig::default()
    }
}

fn publish_spawn_errors(net: &Network) {
    if let Some(e) = net.last_error() {
        set_error(e);
    }
}

/// Create a zeroed network; null on invalid dimensions
///
/// A worker that cannot be started reduces the worker count and is reported
/// through [`cann_get_error`] without failing.
#[no_mangle]
pub extern "C" fn cann_new(
    size: u32,
    num_inputs: u32,
    num_outputs: u32,
    num_threads: u32,
) -> *mut CannNetwork {
    let config = NetworkConfig::new(size as usize, num_inputs as usize, num_outputs as usize)
        .with_scheduler(scheduler(num_threads));
    match Network::new(config) {
        Ok(inner) => {
            publish_spawn_errors(&inner);
            Box::into_raw(Box::new(CannNetwork { inner }))
        }
        Err(e) => {
            set_error(e);
            ptr::null_mut()
        }
    }
}

/// Stop the workers and free the network
#[no_mangle]
pub extern "C" fn cann_del(net: *mut CannNetwork) {
    if net.is_null() {
        return;
    }
    unsafe { drop(Box::from_raw(net)) };
}

/// Neuron count
#[no_mangle]
pub extern "C" fn cann_get_size(net: *const CannNetwork) -> u32 {
    network(net).map_or(0, |n| n.size() as u32)
}

/// Bytes held by the network
#[no_mangle]
pub extern "C" fn cann_get_memory_usage(net: *const CannNetwork) -> usize {
    network(net).map_or(0, Network::memory_usage)
}

/// Input count
#[no_mangle]
pub extern "C" fn cann_get_num_inputs(net: *const CannNetwork) -> u32 {
    network(net).map_or(0, |n| n.num_inputs() as u32)
}

/// Output count
#[no_mangle]
pub extern "C" fn cann_get_num_outputs(net: *const CannNetwork) -> u32 {
    network(net).map_or(0, |n| n.num_outputs() as u32)
}

/// Global learning rate
#[no_mangle]
pub extern "C" fn cann_get_learning_rate(net: *const CannNetwork) -> f32 {
    network(net).map_or(0.0, Network::learning_rate)
}

/// Set the global learning rate
#[no_mangle]
pub extern "C" fn cann_set_learning_rate(net: *mut CannNetwork, learning_rate: f32) {
    if let Some(n) = network_mut(net) {
        n.set_learning_rate(learning_rate);
    }
}

/// Hebbian coefficient `k` of neuron `i`; `k >= 4` records an error
#[no_mangle]
pub extern "C" fn cann_get_gamma(net: *const CannNetwork, i: u32, k: u32) -> f32 {
    network(net).map_or(0.0, |n| match n.state().gamma(i as usize, k as usize) {
        Ok(v) => v,
        Err(e) => {
            set_error(e);
            0.0
        }
    })
}

/// Set Hebbian coefficient `k` of neuron `i`; `k >= 4` records an error
#[no_mangle]
pub extern "C" fn cann_set_gamma(net: *mut CannNetwork, i: u32, k: u32, gamma: f32) {
    if let Some(n) = network_mut(net) {
        if let Err(e) = n.state().set_gamma(i as usize, k as usize, gamma) {
            set_error(e);
        }
    }
}

/// Weight from `j` into `i`
#[no_mangle]
pub extern "C" fn cann_get_weight(net: *const CannNetwork, i: u32, j: u32) -> f32 {
    network(net).map_or(0.0, |n| n.weight(i as usize, j as usize))
}

/// Set the weight from `j` into `i`
#[no_mangle]
pub extern "C" fn cann_set_weight(net: *mut CannNetwork, i: u32, j: u32, weight: f32) {
    if let Some(n) = network_mut(net) {
        n.set_weight(i as usize, j as usize, weight);
    }
}

/// Threshold of neuron `i`
#[no_mangle]
pub extern "C" fn cann_get_threshold(net: *const CannNetwork, i: u32) -> f32 {
    network(net).map_or(0.0, |n| n.threshold(i as usize))
}

/// Set the threshold of neuron `i`
#[no_mangle]
pub extern "C" fn cann_set_threshold(net: *mut CannNetwork, i: u32, threshold: f32) {
    if let Some(n) = network_mut(net) {
        n.set_threshold(i as usize, threshold);
    }
}

/// Activation of neuron `i`
#[no_mangle]
pub extern "C" fn cann_get_activation(net: *const CannNetwork, i: u32) -> f32 {
    network(net).map_or(0.0, |n| n.activation(i as usize))
}

/// Set the activation of neuron `i`
#[no_mangle]
pub extern "C" fn cann_set_activation(net: *mut CannNetwork, i: u32, activation: f32) {
    if let Some(n) = network_mut(net) {
        n.set_activation(i as usize, activation);
    }
}

/// Activation function code of neuron `i`
#[no_mangle]
pub extern "C" fn cann_get_activation_function(net: *const CannNetwork, i: u32) -> u8 {
    network(net).map_or(0, |n| n.state().activation_function_code(i as usize))
}

/// Set the activation function code of neuron `i`; unknown codes evaluate to `0`
#[no_mangle]
pub extern "C" fn cann_set_activation_function(net: *mut CannNetwork, i: u32, code: u8) {
    if let Some(n) = network_mut(net) {
        n.state().set_activation_function_code(i as usize, code);
    }
}

/// Modulatory source neuron of neuron `i`
#[no_mangle]
pub extern "C" fn cann_get_mod_neuron(net: *const CannNetwork, i: u32) -> u32 {
    network(net).map_or(0, |n| n.mod_connection(i as usize).0 as u32)
}

/// Modulatory weight of neuron `i`, as stored (already scaled)
#[no_mangle]
pub extern "C" fn cann_get_mod_weight(net: *const CannNetwork, i: u32) -> f32 {
    network(net).map_or(0.0, |n| n.mod_connection(i as usize).1)
}

/// Route neuron `j` into neuron `i`'s plasticity with `weight` scaled by
/// the current learning rate
#[no_mangle]
pub extern "C" fn cann_set_mod(net: *mut CannNetwork, i: u32, j: u32, weight: f32) {
    if let Some(n) = network_mut(net) {
        n.set_mod(i as usize, j as usize, weight);
    }
}

/// Copy exactly `len` input values; `len` must equal the input count
#[no_mangle]
pub extern "C" fn cann_set_inputs(net: *mut CannNetwork, inputs: *const f32, len: usize) -> i32 {
    let Some(n) = network_mut(net) else {
        return CANN_ERROR;
    };
    let values: &[f32] = if len == 0 {
        &[]
    } else if inputs.is_null() {
        set_error("null input buffer");
        return CANN_ERROR;
    } else {
        unsafe { std::slice::from_raw_parts(inputs, len) }
    };
    match n.set_inputs(values) {
        Ok(()) => CANN_OK,
        Err(e) => {
            set_error(e);
            CANN_ERROR
        }
    }
}

/// Copy the output activations into `out`
///
/// Returns the number of values written, or [`CANN_ERROR`] if `len` is
/// smaller than the output count.
#[no_mangle]
pub extern "C" fn cann_get_outputs(net: *const CannNetwork, out: *mut f32, len: usize) -> i32 {
    let Some(n) = network(net) else {
        return CANN_ERROR;
    };
    let outputs = n.outputs();
    if outputs.is_empty() {
        return 0;
    }
    if out.is_null() || len < outputs.len() {
        set_error(format!("output buffer holds {} values, need {}", len, outputs.len()));
        return CANN_ERROR;
    }
    let dst = unsafe { std::slice::from_raw_parts_mut(out, outputs.len()) };
    dst.copy_from_slice(&outputs);
    i32::try_from(outputs.len()).unwrap_or(i32::MAX)
}

/// Run `n` ticks
#[no_mangle]
pub extern "C" fn cann_step(net: *mut CannNetwork, n: u32) {
    if let Some(network) = network_mut(net) {
        network.run(n);
    }
}

/// Load a `.pcn` file; null on failure
#[no_mangle]
pub extern "C" fn cann_load(path: *const c_char, num_threads: u32) -> *mut CannNetwork {
    let Some(path) = path_arg(path) else {
        return ptr::null_mut();
    };
    match cann_storage::load_from_path(&path, scheduler(num_threads)) {
        Ok(inner) => {
            publish_spawn_errors(&inner);
            Box::into_raw(Box::new(CannNetwork { inner }))
        }
        Err(e) => {
            set_error(format!("{}: {}", path.display(), e));
            ptr::null_mut()
        }
    }
}

/// Save to a `.pcn` file
#[no_mangle]
pub extern "C" fn cann_save(net: *const CannNetwork, path: *const c_char) -> i32 {
    let (Some(n), Some(path)) = (network(net), path_arg(path)) else {
        return CANN_ERROR;
    };
    match cann_storage::save_to_path(n, &path) {
        Ok(()) => CANN_OK,
        Err(e) => {
            set_error(format!("{}: {}", path.display(), e));
            CANN_ERROR
        }
    }
}

/// Write the `.rnn` embedded image
#[no_mangle]
pub extern "C" fn cann_export_embedded(net: *const CannNetwork, path: *const c_char) -> i32 {
    let (Some(n), Some(path)) = (network(net), path_arg(path)) else {
        return CANN_ERROR;
    };
    match cann_storage::export_embedded_to_path(n, &path) {
        Ok(()) => CANN_OK,
        Err(e) => {
            set_error(format!("{}: {}", path.display(), e));
            CANN_ERROR
        }
    }
}

/// Last recorded error message, or null if none
///
/// The pointer stays valid until the next error is recorded or
/// [`cann_reset_error`] is called.
#[no_mangle]
pub extern "C" fn cann_get_error() -> *const c_char {
    LAST_ERROR
        .lock()
        .as_ref()
        .map_or(ptr::null(), |message| message.as_ptr())
}

/// Forget the last error
#[no_mangle]
pub extern "C" fn cann_reset_error() {
    *LAST_ERROR.lock() = None;
}
