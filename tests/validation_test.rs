mod common;

use common::{init, predictor_with, tampines_input, FixedRuntime, MalformedRuntime};
use flatprice::pipeline::LEASE_YEAR_RANGE;
use flatprice::{ModelConfig, PipelineError, PricePredictor, RawInput};
use std::sync::Arc;

#[test]
fn test_non_numeric_floor_area() {
    init();
    let runtime = FixedRuntime::new([0.0; 5]);
    let predictor = predictor_with(runtime.clone());

    for bad in ["", "ninety-five", "95 sqm"] {
        let result = predictor.predict(&RawInput {
            floor_area_sqm: bad.into(),
            ..tampines_input()
        });
        assert!(
            matches!(result, Err(PipelineError::InvalidInput { field: "floor_area_sqm", .. })),
            "'{}' should be rejected",
            bad
        );
    }
    assert_eq!(runtime.calls(), 0);
}

#[test]
fn test_non_integer_lease_commencement() {
    let runtime = FixedRuntime::new([0.0; 5]);
    let predictor = predictor_with(runtime.clone());

    for bad in ["", "1990.0", "nineteen ninety"] {
        let result = predictor.predict(&RawInput {
            lease_commence_date: bad.into(),
            ..tampines_input()
        });
        assert!(matches!(
            result,
            Err(PipelineError::InvalidInput { field: "lease_commence_date", .. })
        ));
    }
    assert_eq!(runtime.calls(), 0);
}

#[test]
fn test_extreme_lease_commencement_rejected() {
    let runtime = FixedRuntime::new([0.0; 5]);
    let predictor = predictor_with(runtime.clone());

    for bad in ["-2147483648", "2147483647", "0", "19900"] {
        let result = predictor.predict(&RawInput {
            lease_commence_date: bad.into(),
            ..tampines_input()
        });
        assert!(
            matches!(result, Err(PipelineError::InvalidInput { field: "lease_commence_date", .. })),
            "'{}' should be rejected",
            bad
        );
    }
    assert_eq!(runtime.calls(), 0);

    let edge = predictor.prepare(&RawInput {
        lease_commence_date: LEASE_YEAR_RANGE.start().to_string(),
        ..tampines_input()
    });
    assert!(edge.is_ok());
}

#[test]
fn test_nan_floor_area_never_reaches_runtime() {
    let runtime = FixedRuntime::new([0.0; 5]);
    let predictor = predictor_with(runtime.clone());

    let result = predictor.predict(&RawInput {
        floor_area_sqm: "NaN".into(),
        ..tampines_input()
    });
    match result {
        Err(PipelineError::InvalidFeatures { index, feature }) => {
            assert_eq!(index, 0);
            assert_eq!(feature, "floor_area_sqm");
        }
        other => panic!("expected InvalidFeatures, got {:?}", other),
    }
    assert_eq!(runtime.calls(), 0);
}

#[test]
fn test_nan_remaining_lease_never_reaches_runtime() {
    let runtime = FixedRuntime::new([0.0; 5]);
    let predictor = predictor_with(runtime.clone());

    let result = predictor.predict(&RawInput {
        remaining_lease: "nan".into(),
        ..tampines_input()
    });
    assert!(matches!(
        result,
        Err(PipelineError::InvalidFeatures { index: 4, .. })
    ));

    let result = predictor.predict(&RawInput {
        floor_area_sqm: "inf".into(),
        ..tampines_input()
    });
    assert!(matches!(result, Err(PipelineError::InvalidFeatures { index: 0, .. })));
    assert_eq!(runtime.calls(), 0);
}

#[test]
fn test_malformed_runtime_output() {
    let predictor = predictor_with(Arc::new(MalformedRuntime));
    let result = predictor.predict(&tampines_input());
    assert!(matches!(result, Err(PipelineError::InferenceFailed(_))));
}

#[test]
fn test_label_mismatch_is_invariant_violation() {
    // Validated configurations always carry five labels.
    let decoder = flatprice::pipeline::DecisionDecoder::new(vec!["only".to_string()]);
    let result = decoder.decode(&[0.0, 3.0, 0.0, 0.0, 0.0]);
    assert!(matches!(result, Err(PipelineError::Invariant(_))));
}

#[test]
fn test_config_vocabulary_mismatch_fails_at_build() {
    let mut config = ModelConfig::builtin().unwrap();
    config.flat_models.truncate(20);
    let result = PricePredictor::builder()
        .with_config(config)
        .and_then(|builder| builder.with_runtime(FixedRuntime::new([0.0; 5])))
        .and_then(|builder| builder.build());
    assert!(matches!(result, Err(PipelineError::Config(_))));
}

#[test]
fn test_concurrent_predictions_share_predictor() {
    let runtime = FixedRuntime::new([0.0, 0.0, 0.0, 1.0, 0.0]);
    let predictor = Arc::new(predictor_with(runtime.clone()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let predictor = Arc::clone(&predictor);
            std::thread::spawn(move || predictor.predict(&tampines_input()).unwrap().label)
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "$700,001 - $1,000,000");
    }
    assert_eq!(runtime.calls(), 4);
}
