//! End-to-end diagnosis: store the scan, run the classifier, render the
//! overlay, persist patient + diagnosis, and return the outcome.
//!
//! The overlay is the only soft step: an explainer failure is logged
//! and degrades the outcome to "no heatmap" while the textual diagnosis
//! and both database writes still go through.

use std::io::Cursor;

use chrono::NaiveDate;
use image::ImageFormat;
use rusqlite::Connection;
use thiserror::Error;

use super::classifier::{OctClassifier, Prediction};
use super::{explain, preprocess, InferenceError};
use crate::config::MODEL_INPUT_SIZE;
use crate::db::repository::{diagnosis, patient};
use crate::db::DatabaseError;
use crate::models::{ClassLabel, DiagnosisOutcome};
use crate::storage::{StorageError, UploadStore};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Everything one upload submits: patient demographics plus the scan.
/// Field validation (extension, date format) happens before this is built.
#[derive(Debug, Clone)]
pub struct DiagnosisRequest {
    pub patient_name: String,
    pub patient_id: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub image_filename: String,
    pub image_bytes: Vec<u8>,
}

/// Run one diagnosis to completion.
///
/// Order matters: the patient upsert precedes the diagnosis insert so
/// the diagnosis row always references an existing patient row.
pub fn run_diagnosis(
    conn: &Connection,
    classifier: &dyn OctClassifier,
    store: &UploadStore,
    doctor_name: &str,
    req: DiagnosisRequest,
) -> Result<DiagnosisOutcome, PipelineError> {
    let stored_name = store.save_original(&req.image_filename, &req.image_bytes)?;

    let input = preprocess::prepare_input(&req.image_bytes, MODEL_INPUT_SIZE)?;
    let prediction = classifier.predict(&input)?;

    let label = ClassLabel::from_index(prediction.argmax()).ok_or_else(|| {
        InferenceError::ModelOutput(format!(
            "class index {} has no label",
            prediction.argmax()
        ))
    })?;
    let confidence_percent = confidence_percent(&prediction);

    let heatmap_name = match write_heatmap(store, &stored_name, &req.image_bytes, &prediction, label)
    {
        Ok(name) => Some(name),
        Err(e) => {
            tracing::warn!("heatmap generation failed, recording diagnosis without it: {e}");
            None
        }
    };

    let scan_date = chrono::Local::now().date_naive();
    patient::upsert_patient(
        conn,
        &req.patient_id,
        &req.patient_name,
        &req.gender,
        req.date_of_birth,
    )?;
    let diagnosis_id = diagnosis::insert_diagnosis(
        conn,
        &req.patient_name,
        &req.patient_id,
        doctor_name,
        scan_date,
        label.as_str(),
    )?;

    tracing::info!(
        diagnosis_id,
        patient_id = %req.patient_id,
        label = label.as_str(),
        confidence_percent,
        heatmap = heatmap_name.is_some(),
        "diagnosis recorded"
    );

    Ok(DiagnosisOutcome {
        diagnosis_id,
        label,
        confidence_percent,
        patient_id: req.patient_id,
        patient_name: req.patient_name,
        gender: req.gender,
        date_of_birth: req.date_of_birth,
        image_name: stored_name,
        heatmap_name,
        scan_time: chrono::Local::now().to_rfc3339(),
    })
}

/// Maximum class probability as a percentage, rounded to 2 decimals.
pub fn confidence_percent(prediction: &Prediction) -> f64 {
    let max = prediction.max_probability() as f64;
    (max * 100.0 * 100.0).round() / 100.0
}

fn write_heatmap(
    store: &UploadStore,
    stored_name: &str,
    original_bytes: &[u8],
    prediction: &Prediction,
    label: ClassLabel,
) -> Result<String, PipelineError> {
    let original = preprocess::decode_rgb(original_bytes)?;
    let overlay = explain::render_overlay(prediction, label, &original)?;

    let format = ImageFormat::from_path(stored_name).unwrap_or(ImageFormat::Png);
    let mut cursor = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(overlay)
        .write_to(&mut cursor, format)
        .map_err(|e| InferenceError::Encoding(e.to_string()))?;

    Ok(store.save_heatmap(stored_name, &cursor.into_inner())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::inference::classifier::MockClassifier;
    use image::{DynamicImage, Rgb, RgbImage};

    fn png_scan() -> Vec<u8> {
        let img = RgbImage::from_pixel(64, 48, Rgb([40, 40, 40]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, image::ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn request(filename: &str, bytes: Vec<u8>) -> DiagnosisRequest {
        DiagnosisRequest {
            patient_name: "Layla Karim".into(),
            patient_id: "P-001".into(),
            gender: "Female".into(),
            date_of_birth: NaiveDate::parse_from_str("1990-04-12", "%Y-%m-%d").unwrap(),
            image_filename: filename.into(),
            image_bytes: bytes,
        }
    }

    fn test_store() -> (tempfile::TempDir, UploadStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = UploadStore::open(tmp.path().join("uploads")).unwrap();
        (tmp, store)
    }

    fn diagnosis_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM diagnoses", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn full_diagnosis_persists_and_reports() {
        let conn = open_memory_database().unwrap();
        let (_tmp, store) = test_store();
        let classifier = MockClassifier::dme();

        let outcome = run_diagnosis(
            &conn,
            &classifier,
            &store,
            "Dr. Amal",
            request("scan.png", png_scan()),
        )
        .unwrap();

        assert_eq!(outcome.label, ClassLabel::Dme);
        assert!((outcome.confidence_percent - 92.0).abs() < 1e-9);
        assert_eq!(outcome.heatmap_name.as_deref(), Some("heatmap_scan.png"));
        assert!(store.path_of("scan.png").exists());
        assert!(store.path_of("heatmap_scan.png").exists());

        assert_eq!(diagnosis_count(&conn), 1);
        let d = diagnosis::find_by_id(&conn, outcome.diagnosis_id)
            .unwrap()
            .unwrap();
        assert_eq!(d.result.as_deref(), Some("DME"));
        assert_eq!(d.doctor_name, "Dr. Amal");
        assert!(patient::find_by_patient_id(&conn, "P-001")
            .unwrap()
            .is_some());
    }

    #[test]
    fn explainer_failure_still_records_diagnosis() {
        let conn = open_memory_database().unwrap();
        let (_tmp, store) = test_store();
        let classifier = MockClassifier::degenerate();

        let outcome = run_diagnosis(
            &conn,
            &classifier,
            &store,
            "Dr. Amal",
            request("scan.png", png_scan()),
        )
        .unwrap();

        assert!(outcome.heatmap_name.is_none());
        assert_eq!(outcome.label, ClassLabel::Normal);
        assert_eq!(diagnosis_count(&conn), 1);
        assert!(!store.path_of("heatmap_scan.png").exists());
    }

    #[test]
    fn repeat_patient_upserts_once_diagnoses_twice() {
        let conn = open_memory_database().unwrap();
        let (_tmp, store) = test_store();
        let classifier = MockClassifier::normal();

        run_diagnosis(
            &conn,
            &classifier,
            &store,
            "Dr. Amal",
            request("a.png", png_scan()),
        )
        .unwrap();

        let mut second = request("b.png", png_scan());
        second.patient_name = "Layla K. Haddad".into();
        run_diagnosis(&conn, &classifier, &store, "Dr. Amal", second).unwrap();

        let patients: i64 = conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
            .unwrap();
        assert_eq!(patients, 1);
        assert_eq!(diagnosis_count(&conn), 2);

        let p = patient::find_by_patient_id(&conn, "P-001").unwrap().unwrap();
        assert_eq!(p.patient_name, "Layla K. Haddad");
    }

    #[test]
    fn confidence_is_rounded_max_probability() {
        let classifier = MockClassifier::with_probabilities(vec![0.123456, 0.876544]);
        let prediction = classifier
            .predict(&ndarray::Array4::zeros((1, 224, 224, 3)))
            .unwrap();

        let confidence = confidence_percent(&prediction);
        assert!((confidence - 87.65).abs() < 1e-9);
        assert!((0.0..=100.0).contains(&confidence));
    }

    #[test]
    fn unreadable_image_fails_before_any_write() {
        let conn = open_memory_database().unwrap();
        let (_tmp, store) = test_store();
        let classifier = MockClassifier::normal();

        let result = run_diagnosis(
            &conn,
            &classifier,
            &store,
            "Dr. Amal",
            request("garbage.png", vec![0xDE, 0xAD, 0xBE, 0xEF]),
        );

        assert!(matches!(
            result,
            Err(PipelineError::Inference(InferenceError::InvalidInput(_)))
        ));
        assert_eq!(diagnosis_count(&conn), 0);
        let patients: i64 = conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
            .unwrap();
        assert_eq!(patients, 0);
    }
}
