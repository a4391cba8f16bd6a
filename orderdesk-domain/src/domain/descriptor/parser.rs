use crate::{InternalError, OrderdeskError};

/// Connection string keys this service understands. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DescriptorKey {
    Host,
    Port,
    Database,
    Username,
    Password,
    Encrypt,
    TrustServerCertificate,
    ConnectTimeout,
}

impl DescriptorKey {
    fn lookup(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "server" | "datasource" | "host" | "address" | "addr" | "networkaddress" => {
                Some(DescriptorKey::Host)
            }
            "port" => Some(DescriptorKey::Port),
            "database" | "initialcatalog" | "dbname" => Some(DescriptorKey::Database),
            "userid" | "uid" | "user" | "username" => Some(DescriptorKey::Username),
            "password" | "pwd" => Some(DescriptorKey::Password),
            "encrypt" => Some(DescriptorKey::Encrypt),
            "trustservercertificate" => Some(DescriptorKey::TrustServerCertificate),
            "connectiontimeout" | "connecttimeout" | "timeout" => {
                Some(DescriptorKey::ConnectTimeout)
            }
            _ => None,
        }
    }
}

/// Splits `key=value;` pairs. Values may be wrapped in braces to carry `;`,
/// with `}}` standing for a literal `}`. Unknown keys are dropped.
pub(crate) fn parse_pairs(input: &str) -> Result<Vec<(DescriptorKey, String)>, OrderdeskError> {
    let chars: Vec<char> = input.chars().collect();
    let mut pairs = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        while pos < chars.len() && (chars[pos].is_whitespace() || chars[pos] == ';') {
            pos += 1;
        }
        if pos >= chars.len() {
            break;
        }

        let key_start = pos;
        while pos < chars.len() && chars[pos] != '=' && chars[pos] != ';' {
            pos += 1;
        }
        if pos >= chars.len() || chars[pos] != '=' {
            return Err(InternalError::configuration_error(
                &format!("Malformed connection string: expected '=' after key at offset {key_start}"),
                Some("connection_string"),
            ));
        }
        let key: String = chars[key_start..pos].iter().collect();
        pos += 1;

        while pos < chars.len() && chars[pos].is_whitespace() && chars[pos] != ';' {
            pos += 1;
        }

        let value = if pos < chars.len() && chars[pos] == '{' {
            pos += 1;
            let mut value = String::new();
            loop {
                match chars.get(pos) {
                    Some('}') if chars.get(pos + 1) == Some(&'}') => {
                        value.push('}');
                        pos += 2;
                    }
                    Some('}') => {
                        pos += 1;
                        break;
                    }
                    Some(c) => {
                        value.push(*c);
                        pos += 1;
                    }
                    None => {
                        return Err(InternalError::configuration_error(
                            &format!(
                                "Malformed connection string: unterminated '{{' for key {}",
                                key.trim()
                            ),
                            Some("connection_string"),
                        ));
                    }
                }
            }
            while pos < chars.len() && chars[pos].is_whitespace() {
                pos += 1;
            }
            if pos < chars.len() && chars[pos] != ';' {
                return Err(InternalError::configuration_error(
                    &format!(
                        "Malformed connection string: unexpected text after braced value for key {}",
                        key.trim()
                    ),
                    Some("connection_string"),
                ));
            }
            value
        } else {
            let value_start = pos;
            while pos < chars.len() && chars[pos] != ';' {
                pos += 1;
            }
            chars[value_start..pos]
                .iter()
                .collect::<String>()
                .trim()
                .to_owned()
        };

        if let Some(key) = DescriptorKey::lookup(&key) {
            pairs.push((key, value));
        }
    }

    Ok(pairs)
}

/// Wraps a value in braces when it would otherwise break the `key=value;` grammar.
pub(crate) fn quote(value: &str) -> String {
    if value.contains([';', '{', '}']) || value.trim() != value {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_owned()
    }
}

pub(crate) fn parse_bool(key: &str, value: &str) -> Result<bool, OrderdeskError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "mandatory" | "strict" => Ok(true),
        "false" | "no" | "0" | "optional" => Ok(false),
        other => Err(InternalError::configuration_error(
            &format!("Invalid boolean '{other}' for {key}"),
            Some("connection_string"),
        )),
    }
}

/// Splits `tcp:host,port` into its host and optional port.
pub(crate) fn parse_server(value: &str) -> Result<(String, Option<u16>), OrderdeskError> {
    let value = value.trim();
    let value = match value.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("tcp:") => &value[4..],
        _ => value,
    };

    match value.rsplit_once(',') {
        Some((host, port)) => {
            let port = port.trim().parse::<u16>().map_err(|_| {
                InternalError::configuration_error(
                    &format!("Invalid port '{}' in server address", port.trim()),
                    Some("connection_string"),
                )
            })?;
            Ok((host.trim().to_owned(), Some(port)))
        }
        None => Ok((value.to_owned(), None)),
    }
}
