use crate::collector::MetricSample;

/// Форматтер в Influx line protocol (то, что ждет telegraf execd)
pub struct LineProtocolFormatter;

impl LineProtocolFormatter {
    /// `ds389,port=389,server=ds currentconnections=5i 1700000000000000000`
    ///
    /// Возвращает None для сэмпла без полей: такая строка невалидна.
    pub fn format_sample(sample: &MetricSample) -> Option<String> {
        if sample.fields.is_empty() {
            return None;
        }

        let mut line = escape(&sample.name, &[',', ' ']);

        for (key, value) in &sample.tags {
            if value.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&escape(key, &[',', '=', ' ']));
            line.push('=');
            line.push_str(&escape(value, &[',', '=', ' ']));
        }

        let fields: Vec<String> = sample
            .fields
            .iter()
            .map(|(key, value)| format!("{}={}i", escape(key, &[',', '=', ' ']), value))
            .collect();

        line.push(' ');
        line.push_str(&fields.join(","));

        if let Some(ns) = sample.timestamp.timestamp_nanos_opt() {
            line.push(' ');
            line.push_str(&ns.to_string());
        }

        Some(line)
    }
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
