use chrono::{DateTime, Local, TimeZone};

pub fn format_timestamp(timestamp: Option<i64>) -> String {
    let Some(ts) = timestamp else {
        return "-".to_string();
    };

    let datetime: DateTime<Local> = match Local.timestamp_millis_opt(ts).single() {
        Some(dt) => dt,
        None => return "-".to_string(),
    };

    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_score(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_render_as_dash() {
        assert_eq!(format_timestamp(None), "-");
        assert_eq!(format_score(None), "-");
        assert_eq!(or_dash(None), "-");
    }

    #[test]
    fn test_format_score_two_decimals() {
        assert_eq!(format_score(Some(0.456)), "0.46");
    }

    #[test]
    fn test_format_timestamp_shape() {
        let formatted = format_timestamp(Some(1_700_000_000_000));
        assert_eq!(formatted.len(), "2023-11-14 22:13:20".len());
    }
}
