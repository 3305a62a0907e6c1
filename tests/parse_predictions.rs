use seeclaw_parser::{
    action_parser, ActionValue, Dialect, FactorInput, ModelVersion, ParseRequest, ParserError,
};

#[test]
fn multi_step_prediction_with_reflection() {
    let prediction = "Reflection: the dialog is still open\n\
                      Action_Summary: close it, then type the name\n\
                      Action: click(start_box='<|box_start|>(980,20)<|box_end|>')\n\
                      \n\
                      type(content='Jane Doe\\n')\n\
                      hotkey(key='ctrl s')";
    let req = ParseRequest::new(prediction).screen(1920, 1080).scale_factor(1.0);
    let out = action_parser(&req).unwrap();

    assert_eq!(out.parsed.len(), 3);
    for action in &out.parsed {
        assert_eq!(action.reflection.as_deref(), Some("the dialog is still open"));
        assert_eq!(action.thought, "close it, then type the name");
    }

    let click = &out.parsed[0];
    assert_eq!(click.action_type, "click");
    assert_eq!(click.input("start_box"), Some("[0.98,0.02,0.98,0.02]"));
    assert_eq!(click.start_point(), Some((1881.6, 21.6)));

    let typed = &out.parsed[1];
    assert_eq!(typed.action_type, "type");
    assert_eq!(typed.input("content"), Some("Jane Doe\\n"));

    let hotkey = &out.parsed[2];
    assert_eq!(hotkey.action_type, "hotkey");
    assert_eq!(hotkey.input("key"), Some("ctrl s"));
}

#[test]
fn free_text_output_falls_back_to_heuristic() {
    let req = ParseRequest::new("I should click the OK button at (640, 360).").screen(1280, 720);
    let out = action_parser(&req).unwrap();
    assert_eq!(out.parsed.len(), 1);
    assert_eq!(out.parsed[0].action_type, "click");
    assert_eq!(out.parsed[0].thought, "");
    assert_eq!(out.parsed[0].start_point(), Some((819.2, 259.2)));
}

#[test]
fn garbage_never_errors() {
    for text in ["", "   ", "???", "Action:", "<Output></Output>", "Thought:\nAction:\n\n\n"] {
        for mode in [Dialect::Bc, Dialect::O1] {
            let req = ParseRequest::new(text).mode(mode).screen(800, 600);
            let out = action_parser(&req).unwrap();
            assert!(out.parsed.iter().all(|a| a.action_type.is_empty()));
        }
    }
}

#[test]
fn scroll_with_direction_keeps_plain_args() {
    let req = ParseRequest::new("Thought: see more\nAction: scroll(start_box='(500,500)', direction='down')")
        .model_ver(ModelVersion::V1_5)
        .screen(1000, 1000);
    let out = action_parser(&req).unwrap();
    let scroll = &out.parsed[0];
    assert_eq!(scroll.input("direction"), Some("down"));
    assert!(matches!(scroll.action_inputs.get("start_coords"), Some(ActionValue::Coords(c)) if c.len() == 2));
}

#[test]
fn negative_factor_is_rejected() {
    let req = ParseRequest::new("Action: wait()").factor(FactorInput::Pair([1000.0, -1.0]));
    assert!(matches!(action_parser(&req), Err(ParserError::InvalidConfig(_))));
}
