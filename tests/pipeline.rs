use std::sync::OnceLock;

use serde_json::json;

use rent_predictor::dataset::{load_listings, write_listings, SyntheticListings};
use rent_predictor::locality::{resolve, ResolveMode};
use rent_predictor::{
    PredictError, PredictionRequest, PredictionResponse, PredictionService, PredictorError,
    ServiceConfig, TrainedModel, TrainingPipeline, TrainingReport, ValidationError,
};

fn trained() -> &'static (TrainedModel, TrainingReport) {
    static MODEL: OnceLock<(TrainedModel, TrainingReport)> = OnceLock::new();
    MODEL.get_or_init(|| {
        let records = SyntheticListings::new(2024).records(2000);
        TrainingPipeline::builder()
            .n_estimators(20)
            .max_depth(12)
            .build()
            .unwrap()
            .fit(&records)
            .unwrap()
    })
}

#[test]
fn test_csv_train_save_load_predict() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("listings.csv");
    let model_path = dir.path().join("rent_model.bin");

    write_listings(&csv_path, &SyntheticListings::new(9).records(1200)).unwrap();
    let listings = load_listings(&csv_path).unwrap();
    assert_eq!(listings.len(), 1200);

    let (model, report) = TrainingPipeline::builder()
        .n_estimators(10)
        .max_depth(10)
        .build()
        .unwrap()
        .fit(&listings)
        .unwrap();
    assert!(report.filter.kept < report.filter.total);
    model.save(&model_path).unwrap();

    let service = PredictionService::load(&ServiceConfig::new(&model_path)).unwrap();
    assert_eq!(service.model().mae(), report.metrics.mae);

    let request = PredictionRequest::new(2, 2, 750.0, "Semi-Furnished", "Apartment")
        .with_locality("Andheri");
    let from_disk = service.predict(&request).unwrap();
    let in_memory = PredictionService::new(model).predict(&request).unwrap();
    assert_eq!(from_disk, in_memory);
}

#[test]
fn test_reference_flat_in_andheri() {
    let (model, _) = trained();
    let service = PredictionService::new(model.clone());
    let (status, response) = service.respond(&json!({
        "bedrooms": 2,
        "bathrooms": 2,
        "area_sqft": 750,
        "furnishing": "Semi-Furnished",
        "property_type": "Apartment",
        "locality": "Andheri"
    }));

    assert_eq!(status, 200);
    let PredictionResponse::Success {
        predicted_rent,
        locality_used,
        ..
    } = response
    else {
        panic!("expected success, got {:?}", response);
    };
    assert!(predicted_rent > 0);
    assert_eq!(locality_used, "Andheri");
    // synthetic Andheri rents sit between 40 and 100 per sqft
    assert!((20_000..=90_000).contains(&predicted_rent), "{}", predicted_rent);
}

#[test]
fn test_nashik_is_other_at_training_and_inference() {
    let (model, _) = trained();
    let localities = model.categories("locality").unwrap();
    assert!(!localities.iter().any(|l| l == "Nashik"));
    assert!(localities.iter().any(|l| l == "Other"));

    let result = PredictionService::new(model.clone())
        .predict(
            &PredictionRequest::new(2, 2, 900.0, "Unfurnished", "Apartment")
                .with_locality("Nashik"),
        )
        .unwrap();
    assert_eq!(result.locality_used, "Other");
}

#[test]
fn test_kandarpada_address_merges_into_borivali() {
    assert_eq!(
        resolve(Some("123 MG Road, Kandarpada West"), ResolveMode::Training),
        "Borivali"
    );
    let (model, _) = trained();
    assert!(model
        .categories("locality")
        .unwrap()
        .iter()
        .any(|l| l == "Borivali"));
}

#[test]
fn test_invalid_requests_never_reach_the_model() {
    let (model, _) = trained();
    let service = PredictionService::new(model.clone());
    let cases = [
        (json!({"bedrooms": 0, "bathrooms": 1, "area_sqft": 900,
                "furnishing": "Unfurnished", "property_type": "Apartment"}), "bedrooms"),
        (json!({"bedrooms": 2, "bathrooms": 1, "area_sqft": 449,
                "furnishing": "Unfurnished", "property_type": "Apartment"}), "area_sqft"),
        (json!({"bedrooms": "two", "bathrooms": 1, "area_sqft": 900,
                "furnishing": "Unfurnished", "property_type": "Apartment"}), "bedrooms"),
        (json!({"bedrooms": 2, "area_sqft": 900,
                "furnishing": "Unfurnished", "property_type": "Apartment"}), "bathrooms"),
    ];
    for (body, field) in cases {
        let (status, response) = service.respond(&body);
        assert_eq!(status, 400);
        match response {
            PredictionResponse::Fail { message } => {
                assert!(message.contains(field), "{}", message)
            }
            other => panic!("expected fail, got {:?}", other),
        }
    }

    let err = service
        .predict(&PredictionRequest::new(1, 1, 300.0, "Unfurnished", "Apartment"))
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(matches!(
        err,
        PredictError::Validation(ValidationError::OutOfRange {
            field: "area_sqft",
            ..
        })
    ));
}

#[test]
fn test_artifact_is_stable_across_reloads() {
    let (model, _) = trained();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    model.save(&path).unwrap();

    let first = TrainedModel::load(&path).unwrap();
    first.save(&path).unwrap();
    let second = TrainedModel::load(&path).unwrap();

    assert_eq!(first.to_bytes().unwrap(), second.to_bytes().unwrap());
    assert_eq!(first.metadata(), model.metadata());
}

#[test]
fn test_corrupt_artifact_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    std::fs::write(&path, b"definitely not a model").unwrap();
    assert!(matches!(
        PredictionService::load(&ServiceConfig::new(&path)),
        Err(PredictorError::ArtifactFormat(_))
    ));
}

#[test]
fn test_too_few_rows_aborts_training() {
    let records = SyntheticListings::new(77).records(300);
    let result = TrainingPipeline::builder().n_estimators(2).build().unwrap().fit(&records);
    assert!(matches!(
        result,
        Err(PredictorError::InsufficientData { required: 500, .. })
    ));
}
