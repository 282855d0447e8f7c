use crate::infra::{seed_field_definitions, InMemoryFieldStore, InMemorySubmissionStore};
use clap::Args;
use inquiry::error::AppError;
use inquiry::forms::{
    FieldRegistry, FormRow, FormSession, IntakeError, ServiceCategory, SessionPhase,
    SubmissionFilter, SubmissionIntake, SubmissionStatus, TriageService, ValidationError,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Category to walk through (defaults to conferences)
    #[arg(long)]
    pub(crate) service_type: Option<String>,
    /// Print the triage CSV export at the end of the run
    #[arg(long)]
    pub(crate) export: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        service_type,
        export,
    } = args;

    let category = ServiceCategory::new(service_type.unwrap_or_else(|| "conferences".to_string()));

    let field_store = Arc::new(InMemoryFieldStore::default());
    let submission_store = Arc::new(InMemorySubmissionStore::default());
    let registry = Arc::new(FieldRegistry::new(field_store));
    let intake = Arc::new(SubmissionIntake::new(submission_store.clone()));
    let triage = TriageService::new(submission_store);

    println!("Enquiry form demo — category '{category}'");
    seed_field_definitions(&registry)?;

    let mut session = FormSession::new(registry, intake, category.clone());
    session.load_schema()?;

    match session.phase() {
        SessionPhase::Ready { schema, .. } => {
            println!("\nRendered form ({} active fields):", schema.len());
            for row in session.layout().rows {
                match row {
                    FormRow::Full { field } => {
                        println!("  [{:<8}] {}", field.field_type.input_type(), field.field_label);
                    }
                    FormRow::Pair { left, right } => {
                        let right_label = right
                            .map(|field| field.field_label)
                            .unwrap_or_else(|| "—".to_string());
                        println!(
                            "  [{:<8}] {} | {}",
                            left.field_type.input_type(),
                            left.field_label,
                            right_label
                        );
                    }
                }
            }
        }
        SessionPhase::Empty => {
            println!("Category '{category}' has no active fields; nothing to render.");
            return Ok(());
        }
        other => {
            println!("Unexpected session phase: {other:?}");
            return Ok(());
        }
    }

    println!("\nSubmitting with the required email left blank:");
    session.update_value("name", "Jane Doe");
    session.update_value("message", "We would like to talk about your conferences.");
    match session.submit() {
        Err(IntakeError::Validation(ValidationError::MissingRequired(labels))) => {
            println!("  rejected — missing: {}", labels.join(", "));
        }
        Ok(_) => println!("  unexpectedly accepted"),
        Err(other) => return Err(other.into()),
    }

    println!("Correcting and resubmitting:");
    session.update_value("email", "jane.doe@example.com");
    let submission = session.submit()?;
    println!(
        "  accepted — {} [{}] at {}",
        submission.id.0,
        submission.status.label(),
        submission.created_at.to_rfc3339()
    );

    println!("\nTriage:");
    let listed = triage
        .list_submissions(&SubmissionFilter {
            service_type: Some(category),
            status: None,
        })
        .map_err(|error| AppError::Triage(error.into()))?;
    for entry in &listed {
        println!(
            "  - {} | {} <{}> | {}",
            entry.id.0,
            entry.name,
            entry.email,
            entry.status.label()
        );
    }

    let reviewed = triage
        .set_status(&submission.id, SubmissionStatus::InProgress)
        .map_err(|error| AppError::Triage(error.into()))?;
    let resolved = triage
        .set_status(&reviewed.id, SubmissionStatus::Resolved)
        .map_err(|error| AppError::Triage(error.into()))?;
    println!(
        "  {} moved {} -> {} -> {}",
        resolved.id.0,
        SubmissionStatus::New.label(),
        SubmissionStatus::InProgress.label(),
        resolved.status.label()
    );

    if export {
        println!("\nCSV export:");
        let csv = triage.export_csv(&SubmissionFilter::default())?;
        print!("{csv}");
    }

    Ok(())
}
