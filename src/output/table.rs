use crate::model::DuplicateHostKey;
use std::fmt::Write;

pub fn render_table(duplicates: &[DuplicateHostKey]) -> String {
    let mut out = String::new();
    for dup in duplicates {
        let _ = writeln!(out, "Duplicate host key {} used by hosts:", dup.fingerprint);
        for host in &dup.hosts {
            let _ = writeln!(out, "  - {}", host);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Fingerprint;

    #[test]
    fn test_table_lines() {
        let duplicates = vec![
            DuplicateHostKey::new(
                Fingerprint::from("SHA256:abc"),
                vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            ),
            DuplicateHostKey::new(
                Fingerprint::from("SHA256:def"),
                vec!["10.0.0.3".to_string(), "10.0.0.4".to_string()],
            ),
        ];

        assert_eq!(
            render_table(&duplicates),
            "Duplicate host key SHA256:abc used by hosts:\n  - 10.0.0.1\n  - 10.0.0.2\n\
             Duplicate host key SHA256:def used by hosts:\n  - 10.0.0.3\n  - 10.0.0.4\n"
        );
    }

    #[test]
    fn test_table_empty() {
        assert_eq!(render_table(&[]), "");
    }
}
