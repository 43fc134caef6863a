use super::common::*;
use crate::board::applications::domain::ApplicationStatus;
use crate::board::applications::service::{ApplicationServiceError, ErrorKind};
use crate::board::employers::{ContactPerson, EmployerProfile, EmployerRepository};
use crate::board::identity::{Actor, ApplicationId, EmployerId, JobId, Role, UserId};
use crate::board::notifications::NotificationKind;

fn job_id() -> JobId {
    JobId("job-001".to_string())
}

fn submitted(harness: &Harness) -> ApplicationId {
    harness
        .service
        .submit(&seeker_actor(), &job_id(), intake())
        .expect("submission succeeds")
        .application
        .id
}

#[test]
fn admin_and_owning_employer_can_update_status() {
    let harness = harness();
    let id = submitted(&harness);

    let updated = harness
        .service
        .update_status(
            &admin_actor(),
            &id,
            ApplicationStatus::UnderReview,
            Some("Screening call booked".to_string()),
        )
        .expect("admin update succeeds");
    assert_eq!(updated.status, ApplicationStatus::UnderReview);
    assert!(updated.updated_at_manual.is_some());
    assert_eq!(
        updated.history.last().and_then(|entry| entry.note.as_deref()),
        Some("Screening call booked")
    );

    let updated = harness
        .service
        .update_status(&employer_actor(), &id, ApplicationStatus::Interview, None)
        .expect("employer update succeeds");
    assert_eq!(updated.status, ApplicationStatus::Interview);
}

#[test]
fn foreign_employer_cannot_update_status() {
    let harness = harness();
    let id = submitted(&harness);

    harness
        .employers
        .insert(EmployerProfile {
            id: EmployerId("emp-002".to_string()),
            user: UserId("user-rival-employer".to_string()),
            organization_name: "Lakeside Clinic".to_string(),
            contact: ContactPerson {
                name: "Rohan Shetty".to_string(),
                email: "talent@lakeside.example".to_string(),
            },
            settings: Default::default(),
            stats: Default::default(),
        })
        .expect("rival employer seeds");

    let rival = Actor::new("user-rival-employer", Role::Employer);
    let err = harness
        .service
        .update_status(&rival, &id, ApplicationStatus::Rejected, None)
        .expect_err("foreign employer rejected");
    assert!(matches!(err, ApplicationServiceError::Forbidden));
}

#[test]
fn seeker_cannot_update_status() {
    let harness = harness();
    let id = submitted(&harness);

    let err = harness
        .service
        .update_status(&seeker_actor(), &id, ApplicationStatus::Offered, None)
        .expect_err("seeker role rejected");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn update_status_on_missing_application_is_not_found() {
    let harness = harness();

    let err = harness
        .service
        .update_status(
            &admin_actor(),
            &ApplicationId("app-missing".to_string()),
            ApplicationStatus::Rejected,
            None,
        )
        .expect_err("missing application rejected");
    assert!(matches!(err, ApplicationServiceError::NotFound));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn hire_counter_tracks_offered_transitions_symmetrically() {
    let harness = harness();
    let id = submitted(&harness);
    let employer_id = employer_profile().id;

    harness
        .service
        .update_status(&employer_actor(), &id, ApplicationStatus::Offered, None)
        .expect("offer succeeds");
    assert_eq!(harness.employers.stats_of(&employer_id).total_hires, 1);

    // Same-state write changes nothing.
    harness
        .service
        .update_status(&employer_actor(), &id, ApplicationStatus::Offered, None)
        .expect("repeat offer succeeds");
    assert_eq!(harness.employers.stats_of(&employer_id).total_hires, 1);

    harness
        .service
        .update_status(&employer_actor(), &id, ApplicationStatus::Rejected, None)
        .expect("rejection succeeds");
    assert_eq!(harness.employers.stats_of(&employer_id).total_hires, 0);
}

#[test]
fn status_change_notifies_seeker_once_per_transition() {
    let harness = harness();
    let id = submitted(&harness);

    harness
        .service
        .update_status(&employer_actor(), &id, ApplicationStatus::UnderReview, None)
        .expect("transition succeeds");

    let notifications = harness
        .emitter
        .list_for_user(&seeker_profile().user)
        .expect("list succeeds");
    let status_notifications: Vec<_> = notifications
        .iter()
        .filter(|notification| notification.kind == NotificationKind::ApplicationStatus)
        .collect();
    assert_eq!(status_notifications.len(), 1);
    assert_eq!(
        status_notifications[0].metadata.get("oldStatus").map(String::as_str),
        Some("Applied")
    );
    assert_eq!(
        status_notifications[0].metadata.get("status").map(String::as_str),
        Some("Under Review")
    );

    // Under Review is not an email-worthy transition.
    assert!(harness.mailer.status_updates().is_empty());
}

#[test]
fn interview_and_offer_transitions_email_the_seeker() {
    let harness = harness();
    let id = submitted(&harness);

    harness
        .service
        .update_status(&employer_actor(), &id, ApplicationStatus::Interview, None)
        .expect("interview succeeds");
    assert_eq!(harness.mailer.status_updates().len(), 1);

    harness
        .service
        .update_status(&employer_actor(), &id, ApplicationStatus::Offered, None)
        .expect("offer succeeds");
    let updates = harness.mailer.status_updates();
    assert_eq!(updates.len(), 2);
    assert!(updates
        .iter()
        .all(|message| message.to == "maya.raman@example.com"));
}

#[test]
fn rating_is_validated_and_leaves_no_history() {
    let harness = harness();
    let id = submitted(&harness);

    for invalid in [0, 6, -1] {
        let err = harness
            .service
            .set_rating(&employer_actor(), &id, invalid)
            .expect_err("out-of-range rating rejected");
        match err {
            ApplicationServiceError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "rating");
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    let rated = harness
        .service
        .set_rating(&employer_actor(), &id, 4)
        .expect("valid rating succeeds");
    assert_eq!(rated.rating, Some(4));
    assert_eq!(rated.history.len(), 1, "rating leaves no audit entry");
}

#[test]
fn rating_during_interview_sends_a_reminder_email() {
    let harness = harness();
    let id = submitted(&harness);

    harness
        .service
        .set_rating(&employer_actor(), &id, 3)
        .expect("rating succeeds");
    assert!(harness.mailer.status_updates().is_empty());

    harness
        .service
        .update_status(&employer_actor(), &id, ApplicationStatus::Interview, None)
        .expect("interview succeeds");
    let before = harness.mailer.status_updates().len();

    harness
        .service
        .set_rating(&employer_actor(), &id, 5)
        .expect("rating succeeds");
    assert_eq!(harness.mailer.status_updates().len(), before + 1);
}

#[test]
fn employer_fetch_flips_viewed_flag_once() {
    let harness = harness();
    let id = submitted(&harness);

    let seen = harness
        .service
        .fetch(&seeker_actor(), &id)
        .expect("owner seeker fetch succeeds");
    assert!(!seen.is_viewed_by_employer);

    let seen = harness
        .service
        .fetch(&employer_actor(), &id)
        .expect("employer fetch succeeds");
    assert!(seen.is_viewed_by_employer);

    let stored = harness
        .applications
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("record present");
    assert!(stored.is_viewed_by_employer);
}

#[test]
fn fetch_is_forbidden_for_unrelated_users() {
    let harness = harness();
    let id = submitted(&harness);

    let stranger = Actor::new("user-stranger", Role::Seeker);
    let err = harness
        .service
        .fetch(&stranger, &id)
        .expect_err("stranger rejected");
    assert!(matches!(err, ApplicationServiceError::Forbidden));

    let admin = harness
        .service
        .fetch(&admin_actor(), &id)
        .expect("admin fetch succeeds");
    assert_eq!(admin.id, id);
}
