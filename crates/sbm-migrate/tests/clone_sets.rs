use std::sync::Arc;

use sbm_gateway::{Applied, Message, MessageSetSummary, MessagingApi, ScheduleId};
use sbm_migrate::clone_sets::clone_evening_sets;
use sbm_model::MessageSetId;
use sbm_test_utils::FakeGateway;

fn set(id: u64, short_name: &str) -> MessageSetSummary {
    MessageSetSummary {
        id: MessageSetId(id),
        short_name: short_name.to_string(),
        default_schedule: Some(ScheduleId(3)),
        content_type: Some("audio".to_string()),
        channel: None,
        next_set: None,
    }
}

fn messages(count: u32) -> Vec<Message> {
    (1..=count)
        .map(|sequence_number| Message {
            id: u64::from(sequence_number),
            sequence_number,
            lang: "eng_ZA".to_string(),
            text_content: None,
            binary_content: None,
        })
        .collect()
}

fn gateway(gateway: FakeGateway) -> FakeGateway {
    gateway
        .with_message_set(set(1, "momconnect_audio_9_11.mon_wed"), messages(3))
        .with_message_set(set(2, "momconnect_audio_2_5.mon_wed"), messages(2))
        .with_message_set(set(3, "pmtct_audio_9_11.tue_thu"), messages(5))
        .with_message_set(set(4, "pmtct_audio_6_8.tue_thu"), Vec::new())
}

#[tokio::test]
async fn dry_run_creates_nothing() {
    let gateway = Arc::new(gateway(FakeGateway::dry_run()));
    let cloned = clone_evening_sets(gateway.as_ref() as &dyn MessagingApi, |_| {})
        .await
        .unwrap();

    assert_eq!(cloned.len(), 2);
    assert_eq!(cloned[0].target, Applied::DryRun);
    assert_eq!(cloned[0].messages, 3);
    // the existing copy is still found
    assert_eq!(cloned[1].target, Applied::Done(MessageSetId(4)));
    let calls = gateway.calls();
    assert_eq!(calls.writes(), 0);
    assert_eq!(
        calls.message_set_lookups,
        ["momconnect_audio_6_8.mon_wed", "pmtct_audio_6_8.tue_thu"]
    );
    assert_eq!(calls.message_listings, [MessageSetId(1), MessageSetId(3)]);
}

#[tokio::test]
async fn execute_creates_missing_copies_once() {
    let gateway = Arc::new(gateway(FakeGateway::executing()));

    let mut lines = Vec::new();
    let first = clone_evening_sets(gateway.as_ref(), |entry| lines.push(entry.to_string()))
        .await
        .unwrap();
    let second = clone_evening_sets(gateway.as_ref(), |_| {}).await.unwrap();

    assert_eq!(first[0].target, Applied::Done(MessageSetId(5)));
    assert_eq!(second[0].target, Applied::Done(MessageSetId(5)));
    assert_eq!(
        lines[0],
        "Messageset momconnect_audio_9_11.mon_wed (3 messages) -> momconnect_audio_6_8.mon_wed id: 5"
    );

    let created = gateway.calls().message_sets_created;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].default_schedule, Some(ScheduleId(3)));
}
