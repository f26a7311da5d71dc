use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rent_predictor::dataset::SyntheticListings;
use rent_predictor::trainer::reference_flat;
use rent_predictor::{
    CanonicalFeatureRecord, Furnishing, PredictionRequest, PredictionService, PropertyType,
    TrainedModel, TrainingPipeline,
};

/// Train a model once for prediction benchmarks
fn train_model_for_prediction() -> TrainedModel {
    let records = SyntheticListings::new(42).records(5000);
    let pipeline = TrainingPipeline::builder()
        .n_estimators(100)
        .build()
        .expect("valid training config");
    let (model, _) = pipeline.fit(&records).expect("Failed to fit model");
    model
}

fn batch_records(n: usize) -> Vec<CanonicalFeatureRecord> {
    const LOCALITIES: [&str; 5] = ["Andheri", "Bandra", "Powai", "Other", "Colaba"];
    (0..n)
        .map(|i| CanonicalFeatureRecord {
            bedrooms: 1 + (i % 4) as u32,
            bathrooms: 1 + (i % 3) as u32,
            area_sqft: 480.0 + (i % 50) as f64 * 25.0,
            furnishing: Furnishing::ALL[i % 3],
            property_type: if i % 17 == 0 {
                PropertyType::Villa
            } else {
                PropertyType::Apartment
            },
            locality: LOCALITIES[i % LOCALITIES.len()].to_string(),
        })
        .collect()
}

fn bench_predict_single(c: &mut Criterion) {
    let service = PredictionService::new(train_model_for_prediction());
    let request = PredictionRequest::new(2, 2, 750.0, "Semi-Furnished", "Apartment")
        .with_address("Lokhandwala Complex, Andheri West");

    c.bench_function("predict_single_request", |b| {
        b.iter(|| {
            let result = service.predict(black_box(&request));
            black_box(result)
        });
    });

    let record = reference_flat();
    c.bench_function("predict_single_record", |b| {
        b.iter(|| black_box(service.model().predict_record(black_box(&record))));
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let model = train_model_for_prediction();
    for size in [10, 100, 1000].iter() {
        let records = batch_records(*size);
        c.bench_with_input(BenchmarkId::new("predict_batch", size), &records, |b, records| {
            b.iter(|| black_box(model.predict_records(black_box(records))));
        });
    }
}

criterion_group!(benches, bench_predict_single, bench_predict_batch);
criterion_main!(benches);
