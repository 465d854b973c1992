use snmp2::Value;
use std::net::Ipv4Addr;

/// Строковое значение varbind'а для декодера.
/// `None` для "нет такого объекта" и конца MIB: такие ответы не дают строк таблицы.
pub fn render_value(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Integer(v) => Some(v.to_string()),
        Value::OctetString(bytes) => Some(
            String::from_utf8_lossy(bytes)
                .trim_end_matches('\0')
                .to_string(),
        ),
        Value::Counter32(v) | Value::Unsigned32(v) | Value::Timeticks(v) => Some(v.to_string()),
        Value::Counter64(v) => Some(v.to_string()),
        Value::IpAddress(octets) => Some(Ipv4Addr::from(*octets).to_string()),
        Value::ObjectIdentifier(oid) => Some(oid.to_string()),
        Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => None,
        other => Some(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_scalars() {
        assert_eq!(render_value(&Value::Integer(125)).as_deref(), Some("125"));
        assert_eq!(
            render_value(&Value::OctetString(b"AP8853\0")).as_deref(),
            Some("AP8853")
        );
        assert_eq!(render_value(&Value::Counter32(7)).as_deref(), Some("7"));
        assert_eq!(
            render_value(&Value::IpAddress([10, 0, 0, 5])).as_deref(),
            Some("10.0.0.5")
        );
    }

    #[test]
    fn missing_objects_have_no_value() {
        assert_eq!(render_value(&Value::NoSuchInstance), None);
        assert_eq!(render_value(&Value::NoSuchObject), None);
        assert_eq!(render_value(&Value::EndOfMibView), None);
    }
}
