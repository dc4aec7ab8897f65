pub mod channel;
pub mod cluster;
pub mod ids;
pub mod metric;
pub mod record;
pub mod rule;

pub use channel::{AlertChannel, ChannelType};
pub use cluster::{Cluster, Group};
pub use ids::parse_id_list;
pub use metric::{DataType, MetricKey, NodeInfo, TimeType};
pub use record::AlertRecord;
pub use rule::{AlertRule, CompareOp};
