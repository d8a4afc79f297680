use std::time::Duration;

use agecalc::{AgeComponents, AgeView, Config, Field, RawDateInput, Submission, ValidationError};
use chrono::NaiveDate;
use tokio::time::sleep;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[tokio::test(start_paused = true)]
async fn rejected_submission_mid_reveal_empties_the_counters() {
    let view = AgeView::new(Config::default());

    let first = tokio::spawn({
        let view = view.clone();
        async move {
            view.submit(&RawDateInput::new("31", "05", "1990"), today())
                .await
        }
    });

    sleep(Duration::from_millis(300)).await;
    let midway = view.snapshot();
    assert!(midway.years.is_some_and(|years| years < 34), "{midway:?}");

    let second = view
        .submit(&RawDateInput::new("30", "02", "2023"), today())
        .await;
    let Submission::Rejected(errors) = second else {
        panic!("expected rejection, got {second:?}");
    };
    assert_eq!(errors.get(Field::Date), Some(ValidationError::InvalidDate));
    assert!(view.snapshot().is_empty());

    let first = first.await.unwrap();
    assert_eq!(
        first,
        Submission::Superseded(AgeComponents {
            years: 34,
            months: 0,
            days: 1
        })
    );

    // nothing from the first reveal lands afterwards
    sleep(Duration::from_secs(10)).await;
    let state = view.snapshot();
    assert!(state.is_empty(), "{state:?}");
    assert_eq!(state.errors, Some(errors));
    assert_eq!(state.generation, 2);
}

#[tokio::test(start_paused = true)]
async fn newer_valid_submission_takes_over() {
    let view = AgeView::new(Config::default());

    let first = tokio::spawn({
        let view = view.clone();
        async move {
            view.submit(&RawDateInput::new("1", "1", "1950"), today())
                .await
        }
    });
    sleep(Duration::from_millis(500)).await;

    let second = view
        .submit(&RawDateInput::new("1", "3", "2024"), today())
        .await;
    let expected = AgeComponents {
        years: 0,
        months: 3,
        days: 0,
    };
    assert_eq!(second, Submission::Revealed(expected));
    assert!(matches!(first.await.unwrap(), Submission::Superseded(_)));

    let state = view.snapshot();
    assert_eq!(
        (state.years, state.months, state.days),
        (Some(0), Some(3), Some(0))
    );
    assert_eq!(state.render_line(), "0 years  3 months  0 days");
}

#[tokio::test(start_paused = true)]
async fn reset_retires_a_running_reveal() {
    let view = AgeView::new(Config::default());
    let mut rx = view.subscribe();

    let first = tokio::spawn({
        let view = view.clone();
        async move {
            view.submit(&RawDateInput::new("14", "6", "1992"), today())
                .await
        }
    });
    sleep(Duration::from_millis(100)).await;
    view.reset();

    assert!(matches!(first.await.unwrap(), Submission::Superseded(_)));
    let _ = rx.borrow_and_update();
    sleep(Duration::from_secs(5)).await;
    assert!(!rx.has_changed().unwrap());
    assert!(view.snapshot().is_empty());
}
