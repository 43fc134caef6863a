use clap::Args;
use medhire::board::applications::{
    AnswerEntry, ApplicationStatus, CoverLetter, SubmissionIntake,
};
use medhire::board::identity::{Actor, Role};
use medhire::board::jobs::JobDraft;
use medhire::error::AppError;

use crate::infra;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print the final application document as JSON.
    #[arg(long)]
    pub(crate) json: bool,
    /// Skip the reapplication half of the walkthrough.
    #[arg(long)]
    pub(crate) skip_reapply: bool,
}

fn demo_intake() -> SubmissionIntake {
    SubmissionIntake {
        resume: None,
        cover_letter: CoverLetter {
            text: Some("Eight years of ICU experience across two tertiary hospitals.".to_string()),
            file: None,
        },
        answers: vec![AnswerEntry {
            question_id: Some("q-shift".to_string()),
            question: "Are you available for night shifts?".to_string(),
            answer: "Yes".to_string(),
        }],
    }
}

/// Walk the application lifecycle end to end against the in-memory stack:
/// submission, status progression, withdrawal, reapplication, and the
/// permanent close after the final attempt.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let infra = infra::bootstrap("medhire/applications");
    let seeker = Actor::new("user-seeker", Role::Seeker);
    let employer = Actor::new("user-employer", Role::Employer);

    println!("Job board lifecycle demo");
    println!(
        "- Seeded job {} at employer {}",
        infra.job_id, infra.employer_id
    );

    let receipt = match infra
        .context
        .applications
        .submit(&seeker, &infra.job_id, demo_intake())
    {
        Ok(receipt) => receipt,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    let id = receipt.application.id.clone();
    println!(
        "- Application {} submitted (attempt {} of 2), status {}",
        id,
        receipt.attempt,
        receipt.application.status.label()
    );

    for status in [
        ApplicationStatus::UnderReview,
        ApplicationStatus::Interview,
        ApplicationStatus::Offered,
    ] {
        match infra
            .context
            .applications
            .update_status(&employer, &id, status, None)
        {
            Ok(updated) => println!("- Employer moved the application to {}", updated.status.label()),
            Err(err) => println!("  Status update rejected: {err}"),
        }
    }
    if let Some(profile) = infra.employers.snapshot(&infra.employer_id) {
        println!(
            "- Employer counters: {} applications, {} hires",
            profile.stats.total_applications, profile.stats.total_hires
        );
    }

    if !args.skip_reapply {
        match infra.context.applications.withdraw(&seeker, &id, None) {
            Ok(_) => println!("- Candidate withdrew the offered application"),
            Err(err) => println!("  Withdrawal rejected: {err}"),
        }

        match infra
            .context
            .applications
            .submit(&seeker, &infra.job_id, demo_intake())
        {
            Ok(receipt) => {
                println!("- Candidate reapplied (attempt {} of 2)", receipt.attempt);
                if let Some(warning) = receipt.warning {
                    println!("  Warning: {warning}");
                }
            }
            Err(err) => println!("  Reapplication rejected: {err}"),
        }

        match infra.context.applications.withdraw(&seeker, &id, None) {
            Ok(_) => println!("- Candidate withdrew again"),
            Err(err) => println!("  Withdrawal rejected: {err}"),
        }

        match infra
            .context
            .applications
            .submit(&seeker, &infra.job_id, demo_intake())
        {
            Ok(_) => println!("  Unexpected: a third attempt was accepted"),
            Err(err) => println!("- Third attempt refused as expected: {err}"),
        }
    }

    match infra.job_service.post(
        &infra.employer_id,
        "St. Martha Teaching Hospital",
        JobDraft {
            title: "Night Pharmacist".to_string(),
            specialization: "Pharmacy".to_string(),
            job_type: "Part-time".to_string(),
            expires_at: None,
        },
    ) {
        Ok(job) => {
            println!("- Employer posted a second job: {} ({})", job.title, job.id);
            match infra.job_service.close(&job.id) {
                Ok(closed) => println!("- Then closed it again, status {}", closed.status.label()),
                Err(err) => println!("  Close rejected: {err}"),
            }
        }
        Err(err) => println!("  Job post rejected: {err}"),
    }

    match infra.stats.resync(&infra.employer_id) {
        Ok(stats) => println!(
            "- Resynced employer counters: {} job posts ({} active), {} applications, {} hires",
            stats.total_job_posts,
            stats.active_job_posts,
            stats.total_applications,
            stats.total_hires
        ),
        Err(err) => println!("  Resync unavailable: {err}"),
    }

    let notifications = match infra
        .context
        .notifications
        .list_for_user(&seeker.user)
    {
        Ok(notifications) => notifications,
        Err(err) => {
            println!("  Notification store unavailable: {err}");
            return Ok(());
        }
    };
    println!("- {} notifications stored for the candidate:", notifications.len());
    for notification in &notifications {
        println!("    - [{}] {}", notification.kind.slug(), notification.title);
    }
    println!("- {} emails left the outbox", infra.mailer.sent().len());

    if args.json {
        match infra.context.applications.fetch(&employer, &id) {
            Ok(application) => match serde_json::to_string_pretty(&application) {
                Ok(json) => println!("Final application document:\n{json}"),
                Err(err) => println!("  Document unavailable: {err}"),
            },
            Err(err) => println!("  Document unavailable: {err}"),
        }
    }

    Ok(())
}
