use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 比较类型
///
/// 规则中以整数编码保存：0 相等，1 大于，-1 小于，2 不等于。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Equal,
    Greater,
    Less,
    NotEqual,
}

impl CompareOp {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(CompareOp::Equal),
            1 => Some(CompareOp::Greater),
            -1 => Some(CompareOp::Less),
            2 => Some(CompareOp::NotEqual),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            CompareOp::Equal => 0,
            CompareOp::Greater => 1,
            CompareOp::Less => -1,
            CompareOp::NotEqual => 2,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::Greater => ">",
            CompareOp::Less => "<",
            CompareOp::NotEqual => "!=",
        }
    }
}

/// 告警规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub rule_id: i64,

    /// 指标名称，如 `used_memory`
    pub alert_key: String,

    /// 阈值
    pub alert_value: f64,

    /// 比较类型编码，见 [`CompareOp`]
    pub compare_type: i32,

    /// 检测周期（分钟）
    pub check_cycle: u32,

    /// 上次触发时间
    pub last_check_time: DateTime<Utc>,

    /// 是否启用
    pub status: bool,

    /// 集群级别规则
    #[serde(default)]
    pub global: bool,

    #[serde(default)]
    pub rule_info: String,
}

impl AlertRule {
    pub fn new(rule_id: i64, alert_key: impl Into<String>, op: CompareOp, alert_value: f64) -> Self {
        Self {
            rule_id,
            alert_key: alert_key.into(),
            alert_value,
            compare_type: op.code(),
            check_cycle: 5,
            last_check_time: DateTime::<Utc>::default(),
            status: true,
            global: false,
            rule_info: String::new(),
        }
    }

    pub fn with_check_cycle(mut self, minutes: u32) -> Self {
        self.check_cycle = minutes;
        self
    }

    pub fn with_last_check_time(mut self, time: DateTime<Utc>) -> Self {
        self.last_check_time = time;
        self
    }

    pub fn with_status(mut self, enabled: bool) -> Self {
        self.status = enabled;
        self
    }

    pub fn with_rule_info(mut self, info: impl Into<String>) -> Self {
        self.rule_info = info.into();
        self
    }

    pub fn compare_op(&self) -> Option<CompareOp> {
        CompareOp::from_code(self.compare_type)
    }

    pub fn check_cycle_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.check_cycle))
    }

    /// 距上次触发是否已经超过检测周期
    pub fn cycle_elapsed(&self, now: DateTime<Utc>) -> bool {
        now - self.last_check_time >= self.check_cycle_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_codes() {
        for op in [
            CompareOp::Equal,
            CompareOp::Greater,
            CompareOp::Less,
            CompareOp::NotEqual,
        ] {
            assert_eq!(CompareOp::from_code(op.code()), Some(op));
        }
        assert_eq!(CompareOp::from_code(3), None);
        assert_eq!(CompareOp::from_code(-2), None);
    }

    #[test]
    fn test_cycle_elapsed() {
        let now = Utc::now();
        let rule = AlertRule::new(1, "used_memory", CompareOp::Greater, 100.0)
            .with_check_cycle(5)
            .with_last_check_time(now - Duration::minutes(5));
        assert!(rule.cycle_elapsed(now));

        let rule = rule.with_last_check_time(now - Duration::minutes(4));
        assert!(!rule.cycle_elapsed(now));
    }
}
