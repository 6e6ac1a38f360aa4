#[cfg(test)]
mod command_tests {
    use super::super::*;
    use crate::dynamodb::TypedValue;

    fn parse(line: &str) -> Command {
        parse_command(line)
            .unwrap()
            .unwrap_or_else(|| panic!("{line:?} parsed to nothing"))
    }

    fn key(partition: &str, sort: Option<&str>) -> KeyArgs {
        KeyArgs {
            partition: partition.to_string(),
            sort: sort.map(str::to_string),
        }
    }

    #[test]
    fn test_meta_commands_with_either_prefix() {
        for line in [":q", ":quit", "/q", "/quit", "\\q", "  :q  "] {
            assert_eq!(parse(line), Command::Quit, "{line}");
        }
        for line in [":?", ":help", "/?", "/help"] {
            assert_eq!(parse(line), Command::Help, "{line}");
        }
        assert_eq!(parse("/err"), Command::ShowError);
        assert_eq!(parse(":err"), Command::ShowError);
    }

    #[test]
    fn test_empty_line_is_a_no_op() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_scan_with_and_without_index() {
        assert_eq!(parse("/scan"), Command::Scan { index: None });
        assert_eq!(
            parse("/SCAN by-status"),
            Command::Scan {
                index: Some("by-status".to_string())
            }
        );
    }

    #[test]
    fn test_query_single_argument_is_key_condition() {
        assert_eq!(
            parse("/query pk=42"),
            Command::Query {
                index: None,
                key: KeyValue {
                    name: "pk".to_string(),
                    value: TypedValue::N("42".to_string()),
                },
            }
        );
    }

    #[test]
    fn test_query_first_argument_without_equals_is_index() {
        assert_eq!(
            parse("/query gsi1 status=open"),
            Command::Query {
                index: Some("gsi1".to_string()),
                key: KeyValue {
                    name: "status".to_string(),
                    value: TypedValue::S("open".to_string()),
                },
            }
        );
    }

    #[test]
    fn test_query_two_conditions_uses_the_first() {
        let Command::Query { index, key } = parse("/query a=1 b=2") else {
            panic!("expected query");
        };
        assert_eq!(index, None);
        assert_eq!(key.name, "a");
    }

    #[test]
    fn test_query_without_arguments_reports_usage() {
        assert_eq!(
            parse_command("/query"),
            Err(CommandError::Usage(QUERY_USAGE))
        );
    }

    #[test]
    fn test_query_lone_index_is_not_a_key_condition() {
        assert_eq!(
            parse_command("/query gsi1"),
            Err(CommandError::InvalidKeyValue {
                input: "gsi1".to_string()
            })
        );
    }

    #[test]
    fn test_get_update_delete_keys() {
        assert_eq!(parse("/get u1"), Command::Get(key("u1", None)));
        assert_eq!(parse("/get u1 2024"), Command::Get(key("u1", Some("2024"))));
        assert_eq!(parse("/update u1 x"), Command::Update(key("u1", Some("x"))));
        assert_eq!(parse("/delete u1"), Command::Delete(Some(key("u1", None))));
        assert_eq!(parse("/rm u1 s"), Command::Delete(Some(key("u1", Some("s")))));
        assert_eq!(parse("/delete"), Command::Delete(None));
        assert_eq!(parse("/put"), Command::Put);
    }

    #[test]
    fn test_argument_count_errors_are_usage_strings() {
        let err = parse_command("/get").unwrap_err();
        assert!(err.is_usage());
        assert_eq!(err.to_string(), "Usage: /get pk [sk]");

        let err = parse_command("/update").unwrap_err();
        assert_eq!(err.to_string(), "Usage: /update pk [sk]");
    }

    #[test]
    fn test_unknown_verbs_name_the_token() {
        let err = parse_command("/frobnicate now").unwrap_err();
        assert_eq!(
            err,
            CommandError::UnknownCommand {
                token: "/frobnicate".to_string()
            }
        );
        assert_eq!(err.to_string(), "unknown command: /frobnicate");
        assert!(!err.is_usage());
    }

    #[test]
    fn test_data_verbs_need_the_slash_prefix() {
        assert!(matches!(
            parse_command(":scan"),
            Err(CommandError::UnknownCommand { .. })
        ));
        assert!(matches!(
            parse_command("scan"),
            Err(CommandError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_key_value_classification() {
        let cases = [
            ("pk=42", TypedValue::N("42".into())),
            ("pk = -3.5 ", TypedValue::N("-3.5".into())),
            ("pk=1,2", TypedValue::N("1,2".into())),
            ("pk=abc", TypedValue::S("abc".into())),
            ("pk=\"42\"", TypedValue::S("\"42\"".into())),
            ("pk=", TypedValue::S(String::new())),
            ("pk=a=b", TypedValue::S("a=b".into())),
            ("pk=inf", TypedValue::S("inf".into())),
            ("pk=NaN", TypedValue::S("NaN".into())),
        ];
        for (input, expected) in cases {
            let parsed = parse_key_value(input).unwrap();
            assert_eq!(parsed.name, "pk", "{input}");
            assert_eq!(parsed.value, expected, "{input}");
        }
    }

    #[test]
    fn test_key_value_requires_name_and_equals() {
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=5").is_err());
    }
}
