// Domain models: raw and normalized samples, buckets, segments, reports

mod bucket;
mod report;
mod sample;
mod segment;

pub use bucket::{BucketAggregate, BucketState, ClassifiedBucket};
pub use report::{Diagnostics, GroupTimeline, Report, Summary, TimelineReport, WindowInfo};
pub use sample::{NormalizedSample, RawSample, RawTimestamp, SampleKind};
pub use segment::{AlarmInterval, Segment, SegmentState};
