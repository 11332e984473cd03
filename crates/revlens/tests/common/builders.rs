//! Builders for test data.

#![allow(dead_code)]

use revlens::model::{
    ClassifiedItem, JobRecord, JobResult, JobStatus, Sentiment, StatusEvent, TopicAssignment,
    TopicLabel,
};
use revlens::MonitorConfig;

/// Builder for `ClassifiedItem` instances.
pub struct ItemBuilder {
    item: ClassifiedItem,
}

impl ItemBuilder {
    pub fn new(text: &str) -> Self {
        Self {
            item: ClassifiedItem::new(text, Sentiment::Neutral, "https://example.com/reviews"),
        }
    }

    pub fn sentiment(mut self, sentiment: Sentiment) -> Self {
        self.item.sentiment = sentiment;
        self
    }

    pub fn source(mut self, source_ref: &str) -> Self {
        self.item.source_ref = source_ref.to_string();
        self
    }

    pub fn level1(mut self, level1_id: &str) -> Self {
        self.item.topic_assignment = TopicAssignment::level1(level1_id);
        self
    }

    pub fn level2(mut self, level1_id: &str, level2_name: &str) -> Self {
        self.item.topic_assignment = TopicAssignment::level2(level1_id, level2_name);
        self
    }

    pub fn rating(mut self, rating: f64) -> Self {
        self.item.rating = Some(rating);
        self
    }

    pub fn no_text(mut self) -> Self {
        self.item.text = None;
        self
    }

    pub fn build(self) -> ClassifiedItem {
        self.item
    }
}

/// `count` copies of an item, numbered through their text.
pub fn repeat(count: usize, mut make: impl FnMut(usize) -> ItemBuilder) -> Vec<ClassifiedItem> {
    (0..count).map(|i| make(i).build()).collect()
}

/// 100 items: 60 under `billing` (40 `refunds`, 20 without a level-2
/// topic) and 40 unassigned.
pub fn billing_scenario() -> Vec<ClassifiedItem> {
    let mut items = Vec::new();
    items.extend(repeat(40, |i| {
        ItemBuilder::new(&format!("refund review {}", i))
            .level2("billing", "refunds")
            .sentiment(if i % 4 == 0 {
                Sentiment::Positive
            } else {
                Sentiment::Negative
            })
    }));
    items.extend(repeat(20, |i| {
        ItemBuilder::new(&format!("billing review {}", i)).level1("billing")
    }));
    items.extend(repeat(40, |i| ItemBuilder::new(&format!("other review {}", i))));
    items
}

/// A mixed result set with several topics, ties and missing texts.
pub fn mixed_items() -> Vec<ClassifiedItem> {
    vec![
        ItemBuilder::new("Shipping took weeks").level2("delivery", "delays").build(),
        ItemBuilder::new("Refund never arrived").level2("billing", "refunds").build(),
        ItemBuilder::new("Great app").sentiment(Sentiment::Positive).build(),
        ItemBuilder::new("Package damaged").level2("delivery", "damage").build(),
        ItemBuilder::new("").level1("delivery").build(),
        ItemBuilder::new("Charged twice").level2("billing", "double charge").build(),
        ItemBuilder::new("Login fails").level2("app", "login").build(),
        ItemBuilder::new("x").no_text().level2("delivery", "delays").build(),
        ItemBuilder::new("App crashes").level2("app", "stability").build(),
    ]
}

pub fn topics() -> Vec<TopicLabel> {
    vec![
        TopicLabel {
            id: "billing".to_string(),
            name: "Billing & Payments".to_string(),
        },
        TopicLabel {
            id: "delivery".to_string(),
            name: "Delivery".to_string(),
        },
    ]
}

pub fn event(status: JobStatus, progress: u8) -> StatusEvent {
    StatusEvent::new(status, progress, &format!("{} at {}%", status, progress))
}

pub fn record(status: JobStatus, progress: u8) -> JobRecord {
    JobRecord {
        job_id: None,
        status,
        progress,
        message: format!("{} at {}%", status, progress),
        result: None,
        error: None,
    }
}

pub fn completed_record(result: JobResult) -> JobRecord {
    JobRecord {
        result: Some(result),
        ..record(JobStatus::Completed, 100)
    }
}

pub fn failed_record(error: &str) -> JobRecord {
    JobRecord {
        error: Some(error.to_string()),
        ..record(JobStatus::Failed, 30)
    }
}

pub fn sample_result() -> JobResult {
    JobResult {
        items: mixed_items(),
        topics: topics(),
        report: Some("report_42.xlsx".to_string()),
    }
}

pub fn test_config() -> MonitorConfig {
    MonitorConfig::new("http://localhost:8000")
}
