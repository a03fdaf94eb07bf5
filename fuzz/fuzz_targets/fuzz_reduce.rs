#![no_main]
use libfuzzer_sys::fuzz_target;

use scenic_model::ExecutionTrace;
use scenic_trace::{canonicalize_trace, reduce_to_antichain};

fuzz_target!(|data: &[u8]| {
    if let Ok(mut traces) = serde_json::from_slice::<Vec<ExecutionTrace>>(data) {
        for trace in &mut traces {
            canonicalize_trace(trace);
        }
        let reduced = reduce_to_antichain(traces.clone());
        assert!(reduced.len() <= traces.len());
    }
});
