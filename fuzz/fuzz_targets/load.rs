#![no_main]

use libfuzzer_sys::fuzz_target;
use libfyaml_safer::{yaml_parser_load, yaml_parser_new, yaml_parser_set_input_string};

fuzz_target!(|data: &[u8]| {
    let mut parser = yaml_parser_new();
    let mut input = data;
    yaml_parser_set_input_string(&mut parser, &mut input);

    while let Ok(mut document) = yaml_parser_load(&mut parser) {
        let done = document.get_root_node().is_none();
        if done {
            break;
        }
        let _ = libfyaml_safer::resolve(&mut document);
    }
});
