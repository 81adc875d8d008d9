//! Taxonomy listing, sample downloads and export.

use std::path::{Path, PathBuf};

use crate::api::{ExportSelection, QuestionApiClient, TaxonomyEntity};
use crate::commands::cli::{ApiArgs, TaxonomyLevel};
use crate::error::AppError;
use crate::import::samples::{DEMO_JSON_FILE_NAME, SAMPLE_CSV_FILE_NAME};
use crate::import::{default_export_file_name, export_to_csv, write_demo_json, write_sample_csv};

pub async fn list_taxonomy(args: &ApiArgs, level: &TaxonomyLevel) -> Result<(), AppError> {
    let api = QuestionApiClient::new(&args.to_config()?)?;
    let entities = match level {
        TaxonomyLevel::Categories => api.list_categories().await?,
        TaxonomyLevel::Subjects { category } => api.list_subjects(category).await?,
        TaxonomyLevel::Groups { subject } => api.list_groups(subject).await?,
    };
    print_entities(&entities);
    Ok(())
}

pub fn sample_csv(output: Option<&Path>) -> Result<(), AppError> {
    let path = write_sample_csv(output.unwrap_or_else(|| Path::new(SAMPLE_CSV_FILE_NAME)))?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub fn demo_json(output: Option<&Path>) -> Result<(), AppError> {
    let path = write_demo_json(output.unwrap_or_else(|| Path::new(DEMO_JSON_FILE_NAME)))?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub async fn export(
    args: &ApiArgs,
    selection: ExportSelection,
    output: Option<&Path>,
) -> Result<(), AppError> {
    let api = QuestionApiClient::new(&args.to_config()?)?;
    let path = output.map(Path::to_path_buf).unwrap_or_else(|| {
        PathBuf::from(default_export_file_name(
            &selection,
            chrono::Local::now().date_naive(),
        ))
    });

    let report = export_to_csv(&api, &selection, &path).await?;
    println!("Exported {} questions to {}", report.count, report.path.display());
    Ok(())
}

fn print_entities(entities: &[TaxonomyEntity]) {
    if entities.is_empty() {
        println!("(none)");
    }
    for entity in entities {
        println!("{}\t{}", entity.id, entity.name);
    }
}
