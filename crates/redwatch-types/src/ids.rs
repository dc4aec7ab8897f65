use tracing::warn;

/// 解析逗号分隔的 ID 列表
///
/// 空白会被忽略，空项跳过；无法解析为整数的项记录告警后跳过。
pub fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(entry = %s, list = %raw, "Skipping malformed id in id list");
                None
            }
        })
        .collect()
}
