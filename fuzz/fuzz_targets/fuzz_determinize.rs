#![no_main]
use libfuzzer_sys::fuzz_target;

use scenic_engine::{PipelineOptions, ScenarioPipeline};
use scenic_model::ScenarioPackage;
use scenic_scenario::ExpansionLimits;

fuzz_target!(|data: &[u8]| {
    if let Ok(package) = serde_json::from_slice::<ScenarioPackage>(data) {
        // Small limits keep every run cheap.
        let pipeline = ScenarioPipeline::new(PipelineOptions {
            limits: ExpansionLimits {
                max_branches: 256,
                max_depth: 16,
                max_nodes: 4096,
            },
            ..PipelineOptions::default()
        });
        for name in package.scenarios.keys() {
            if let Ok(simplified) = pipeline.simplify(&package, name, None) {
                let _ = pipeline.linearize(&simplified);
            }
        }
    }
});
