//! `csv` and `json` command handlers.

use std::path::Path;

use tracing::info;

use crate::api::{QuestionApiClient, QuestionApiOps, TaxonomyPicker};
use crate::commands::cli::ApiArgs;
use crate::error::AppError;
use crate::files::{read_csv_file, read_text_source};
use crate::import::{ImportOutcome, ImportSession, ScanResult};
use crate::model::Taxonomy;
use crate::preview::PreviewTable;
use crate::validation;

/// Category, subject and group ids as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyArgs {
    pub category: Option<String>,
    pub subject: Option<String>,
    pub group: Option<String>,
}

impl TaxonomyArgs {
    /// The selection, if all three ids were given.
    pub fn complete(&self) -> Option<Taxonomy> {
        match (&self.category, &self.subject, &self.group) {
            (Some(category), Some(subject), Some(group)) => Some(Taxonomy {
                category: category.clone(),
                subject: subject.clone(),
                question_group: group.clone(),
            }),
            _ => None,
        }
    }
}

pub async fn import_csv(args: &ApiArgs, file: &Path, dry_run: bool) -> Result<(), AppError> {
    let source = read_csv_file(file).await?;

    if dry_run {
        let scan = validation::scan_csv(&source)?;
        print_preview(&scan.preview());
        print_scan_notes(&ScanResult::Csv(scan));
        return Ok(());
    }

    let config = args.to_config()?;
    let api = QuestionApiClient::new(&config)?;
    let mut session = new_session(api, args);

    let preview = session.scan_csv(&source).await?;
    print_preview(&preview);
    if let Some(scan) = session.scan() {
        print_scan_notes(scan);
    }

    let outcome = session.import().await?;
    print_outcome(&outcome);
    Ok(())
}

pub async fn import_json(
    args: &ApiArgs,
    file: &Path,
    taxonomy: &TaxonomyArgs,
    dry_run: bool,
) -> Result<(), AppError> {
    let selection = taxonomy.complete().ok_or(AppError::TaxonomyIncomplete)?;
    let source = read_text_source(file).await?;

    if dry_run {
        let scan = validation::scan_json(&source, &selection)?;
        print_preview(&scan.preview());
        print_scan_notes(&ScanResult::Json(scan));
        return Ok(());
    }

    let config = args.to_config()?;
    let api = QuestionApiClient::new(&config)?;

    let selection = resolve_taxonomy(&api, &selection).await?;

    let mut session = new_session(api, args).with_concurrency(config.concurrency);
    let preview = session.scan_json(&source, Some(&selection)).await?;
    print_preview(&preview);
    if let Some(scan) = session.scan() {
        print_scan_notes(scan);
    }

    let outcome = session.import().await?;
    print_outcome(&outcome);
    Ok(())
}

/// Checks that the given ids name active entries, the same as picking them
/// from the lists. A failed lookup is reported as such, not as an unknown id.
async fn resolve_taxonomy<C: QuestionApiOps>(
    api: &C,
    selection: &Taxonomy,
) -> Result<Taxonomy, AppError> {
    let mut picker = TaxonomyPicker::try_load(api).await?;
    picker
        .select_path(
            api,
            &selection.category,
            &selection.subject,
            &selection.question_group,
        )
        .await
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn new_session<C: QuestionApiOps>(api: C, args: &ApiArgs) -> ImportSession<C> {
    ImportSession::new(api)
        .with_scan_delay(args.scan_delay())
        .on_import_success(|| info!("[IMPORT] Question list changed on the server"))
}

fn print_preview(preview: &PreviewTable) {
    println!("{}", preview.render());
}

fn print_scan_notes(scan: &ScanResult) {
    match scan {
        ScanResult::Csv(scan) => {
            for warning in &scan.warnings {
                println!("warning: {}", warning);
            }
        }
        ScanResult::Json(scan) => {
            for skipped in &scan.skipped {
                println!("skipped entry {}: {}", skipped.index + 1, skipped.reason);
            }
            if scan.dropped > 0 {
                println!(
                    "{} entries without questionText or type were ignored",
                    scan.dropped
                );
            }
        }
    }
}

fn print_outcome(outcome: &ImportOutcome) {
    println!("{}", outcome.message);
    for error in &outcome.errors {
        println!("  - {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::taxonomy::CATEGORIES_PATH;
    use crate::config::AppConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn requested() -> Taxonomy {
        Taxonomy {
            category: "c1".into(),
            subject: "s1".into(),
            question_group: "g1".into(),
        }
    }

    #[test]
    fn taxonomy_args_need_all_three_ids() {
        let mut args = TaxonomyArgs {
            category: Some("c1".into()),
            subject: Some("s1".into()),
            group: None,
        };
        assert!(args.complete().is_none());

        args.group = Some("g1".into());
        assert_eq!(args.complete().unwrap().question_group, "g1");
    }

    #[tokio::test]
    async fn unreachable_categories_are_not_reported_as_unknown_ids() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CATEGORIES_PATH))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;
        let config = AppConfig::from_url(&mock_server.uri()).unwrap();
        let api = QuestionApiClient::new(&config).unwrap();

        let err = resolve_taxonomy(&api, &requested()).await.unwrap_err();
        assert!(matches!(err, AppError::RequestFailed(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn inactive_category_is_unknown() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CATEGORIES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": [{"_id": "c2", "name": "Arts"}]
            })))
            .mount(&mock_server)
            .await;
        let config = AppConfig::from_url(&mock_server.uri()).unwrap();
        let api = QuestionApiClient::new(&config).unwrap();

        let err = resolve_taxonomy(&api, &requested()).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownTaxonomy { level: "category", .. }));
    }
}
