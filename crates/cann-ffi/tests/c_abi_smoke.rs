// Run with: cargo test -p cann-ffi
#![allow(clippy::missing_safety_doc)]

use cann_ffi::c_bindings::*;
use parking_lot::{const_mutex, Mutex};
use std::ffi::{CStr, CString};
use std::ptr;

// the error slot is process-wide; tests touching it take this lock
static ERROR_SLOT: Mutex<()> = const_mutex(());

fn error_message() -> Option<String> {
    let p = cann_get_error();
    if p.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
    }
}

#[test]
fn c_abi_three_neuron_example() {
    let net = cann_new(3, 1, 1, 1);
    assert!(!net.is_null());
    assert_eq!(cann_get_size(net), 3);
    assert!(cann_get_memory_usage(net) > 0);

    cann_set_weight(net, 1, 0, 1.0);
    cann_set_threshold(net, 1, 0.5);
    cann_set_activation_function(net, 1, 0);

    let input = [1.0f32];
    assert_eq!(cann_set_inputs(net, input.as_ptr(), input.len()), CANN_OK);
    cann_step(net, 1);
    assert_eq!(cann_get_activation(net, 1), 1.0);

    let input = [0.4f32];
    assert_eq!(cann_set_inputs(net, input.as_ptr(), input.len()), CANN_OK);
    cann_step(net, 1);
    assert_eq!(cann_get_activation(net, 1), 0.0);

    let mut out = [f32::NAN; 1];
    assert_eq!(cann_get_outputs(net, out.as_mut_ptr(), out.len()), 1);
    assert_eq!(out[0], cann_get_activation(net, 2));

    cann_del(net);
}

#[test]
fn c_abi_mod_weight_is_scaled() {
    let net = cann_new(4, 0, 0, 2);
    cann_set_learning_rate(net, 0.5);
    assert_eq!(cann_get_learning_rate(net), 0.5);

    cann_set_mod(net, 2, 3, 0.8);
    assert_eq!(cann_get_mod_neuron(net, 2), 3);
    assert!((cann_get_mod_weight(net, 2) - 0.4).abs() < 1e-6);
    cann_del(net);
}

#[test]
fn c_abi_error_channel() {
    let _guard = ERROR_SLOT.lock();
    cann_reset_error();
    assert!(cann_get_error().is_null());

    let net = cann_new(3, 1, 1, 1);
    cann_set_gamma(net, 0, 2, 0.25);
    assert_eq!(cann_get_gamma(net, 0, 2), 0.25);
    assert!(cann_get_error().is_null());

    assert_eq!(cann_get_gamma(net, 0, 4), 0.0);
    let message = error_message().expect("gamma error recorded");
    assert!(message.contains("gamma"), "{}", message);

    cann_reset_error();
    let input = [1.0f32, 2.0];
    assert_eq!(cann_set_inputs(net, input.as_ptr(), input.len()), CANN_ERROR);
    assert!(error_message().is_some());

    cann_reset_error();
    assert!(cann_new(0, 0, 0, 1).is_null());
    assert!(error_message().is_some());

    cann_reset_error();
    cann_del(net);
}

#[test]
fn c_abi_save_load_export() {
    let _guard = ERROR_SLOT.lock();
    let dir = tempfile::tempdir().unwrap();
    let pcn = CString::new(dir.path().join("net.pcn").to_str().unwrap()).unwrap();
    let rnn = CString::new(dir.path().join("net.rnn").to_str().unwrap()).unwrap();

    let net = cann_new(5, 2, 1, 1);
    cann_set_weight(net, 4, 0, 0.75);
    cann_set_threshold(net, 4, 0.25);
    cann_set_activation_function(net, 4, 3);
    cann_set_gamma(net, 4, 1, -0.5);
    assert_eq!(cann_save(net, pcn.as_ptr()), CANN_OK);
    assert_eq!(cann_export_embedded(net, rnn.as_ptr()), CANN_OK);

    let loaded = cann_load(pcn.as_ptr(), 2);
    assert!(!loaded.is_null());
    assert_eq!(cann_get_size(loaded), 5);
    assert_eq!(cann_get_weight(loaded, 4, 0), 0.75);
    assert_eq!(cann_get_threshold(loaded, 4), 0.25);
    assert_eq!(cann_get_activation_function(loaded, 4), 3);
    assert_eq!(cann_get_gamma(loaded, 4, 1), -0.5);

    let image = std::fs::read(dir.path().join("net.rnn")).unwrap();
    assert_eq!(&image[..2], b"RN");

    cann_reset_error();
    let missing = CString::new(dir.path().join("missing.pcn").to_str().unwrap()).unwrap();
    assert!(cann_load(missing.as_ptr(), 1).is_null());
    assert!(error_message().is_some());
    cann_reset_error();

    cann_del(loaded);
    cann_del(net);
}

#[test]
fn c_abi_null_handles_are_ignored() {
    let null: *mut CannNetwork = ptr::null_mut();
    assert_eq!(cann_get_size(null), 0);
    assert_eq!(cann_get_memory_usage(null), 0);
    assert_eq!(cann_get_weight(null, 0, 0), 0.0);
    cann_set_weight(null, 0, 0, 1.0);
    cann_step(null, 3);
    assert_eq!(cann_set_inputs(null, ptr::null(), 0), CANN_ERROR);
    assert_eq!(cann_get_outputs(null, ptr::null_mut(), 0), CANN_ERROR);
    cann_del(null);
}

#[test]
fn c_abi_short_output_buffer() {
    let _guard = ERROR_SLOT.lock();
    let net = cann_new(4, 0, 2, 1);
    let mut out = [0.0f32; 1];
    assert_eq!(cann_get_outputs(net, out.as_mut_ptr(), out.len()), CANN_ERROR);
    let mut out = [0.0f32; 2];
    assert_eq!(cann_get_outputs(net, out.as_mut_ptr(), out.len()), 2);
    cann_reset_error();
    cann_del(net);
}
