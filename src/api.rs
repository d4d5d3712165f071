use crate::{Break, Emitter, Encoding, Event, Parser, ScalarStyle, SequenceStyle, MappingStyle};

/// Create a new parser with no input attached yet.
pub fn yaml_parser_new<'r>() -> Parser<'r> {
    Parser::new()
}

/// Reset the parser state.
pub fn yaml_parser_reset(parser: &mut Parser) {
    parser.reset();
}

/// Set a string input. Panics if an input has already been set.
pub fn yaml_parser_set_input_string<'r>(parser: &mut Parser<'r>, input: &'r mut &[u8]) {
    parser.set_input_string(input);
}

/// Set a generic input handler. Panics if an input has already been set.
pub fn yaml_parser_set_input<'r>(parser: &mut Parser<'r>, input: &'r mut dyn std::io::BufRead) {
    parser.set_input(input);
}

/// Set the source encoding. Panics if the encoding has already been set.
pub fn yaml_parser_set_encoding(parser: &mut Parser, encoding: Encoding) {
    parser.set_encoding(encoding);
}

/// Create a new emitter with no output attached yet.
pub fn yaml_emitter_new<'w>() -> Emitter<'w> {
    Emitter::new()
}

/// Reset the emitter state.
pub fn yaml_emitter_reset(emitter: &mut Emitter) {
    *emitter = Emitter::new();
}

/// Set a `Vec<u8>` as the output destination.
///
/// The emitter will write the output characters to the `output` buffer.
pub fn yaml_emitter_set_output_string<'w>(emitter: &mut Emitter<'w>, output: &'w mut Vec<u8>) {
    if emitter.encoding == Encoding::Any {
        yaml_emitter_set_encoding(emitter, Encoding::Utf8);
    } else if emitter.encoding != Encoding::Utf8 {
        panic!("cannot output UTF-16 to a byte buffer")
    }
    output.clear();
    emitter.set_output(output);
}

/// Set a generic output handler.
pub fn yaml_emitter_set_output<'w>(emitter: &mut Emitter<'w>, handler: &'w mut dyn std::io::Write) {
    emitter.set_output(handler);
}

/// Set the output encoding. Panics if the encoding has already been set.
pub fn yaml_emitter_set_encoding(emitter: &mut Emitter, encoding: Encoding) {
    emitter.set_encoding(encoding);
}

/// Set if the output should be in the "canonical" format as in the YAML
/// specification.
pub fn yaml_emitter_set_canonical(emitter: &mut Emitter, canonical: bool) {
    emitter.canonical = canonical;
}

/// Set the indentation increment.
pub fn yaml_emitter_set_indent(emitter: &mut Emitter, indent: i32) {
    emitter.best_indent = if 1 < indent && indent < 10 { indent } else { 2 };
}

/// Set the preferred line width. -1 means unlimited.
pub fn yaml_emitter_set_width(emitter: &mut Emitter, width: i32) {
    emitter.best_width = if width >= 0 { width } else { -1 };
}

/// Set if unescaped non-ASCII characters are allowed.
pub fn yaml_emitter_set_unicode(emitter: &mut Emitter, unicode: bool) {
    emitter.unicode = unicode;
}

/// Set the preferred line break.
pub fn yaml_emitter_set_break(emitter: &mut Emitter, line_break: Break) {
    emitter.line_break = line_break;
}

/// Create the STREAM-START event.
pub fn yaml_stream_start_event_new(encoding: Encoding) -> Event {
    Event::stream_start(encoding)
}

/// Create the STREAM-END event.
pub fn yaml_stream_end_event_new() -> Event {
    Event::stream_end()
}

/// Create the DOCUMENT-START event.
pub fn yaml_document_start_event_new(
    version_directive: Option<crate::VersionDirective>,
    tag_directives: &[crate::TagDirective],
    implicit: bool,
) -> Event {
    Event::document_start(version_directive, tag_directives, implicit)
}

/// Create the DOCUMENT-END event.
pub fn yaml_document_end_event_new(implicit: bool) -> Event {
    Event::document_end(implicit)
}

/// Create an ALIAS event.
pub fn yaml_alias_event_new(anchor: &str) -> Event {
    Event::alias(anchor)
}

/// Create a SCALAR event.
pub fn yaml_scalar_event_new(
    anchor: Option<&str>,
    tag: Option<&str>,
    value: &str,
    plain_implicit: bool,
    quoted_implicit: bool,
    style: ScalarStyle,
) -> Event {
    Event::scalar(anchor, tag, value, plain_implicit, quoted_implicit, style)
}

/// Create a SEQUENCE-START event.
pub fn yaml_sequence_start_event_new(
    anchor: Option<&str>,
    tag: Option<&str>,
    implicit: bool,
    style: SequenceStyle,
) -> Event {
    Event::sequence_start(anchor, tag, implicit, style)
}

/// Create a SEQUENCE-END event.
pub fn yaml_sequence_end_event_new() -> Event {
    Event::sequence_end()
}

/// Create a MAPPING-START event.
pub fn yaml_mapping_start_event_new(
    anchor: Option<&str>,
    tag: Option<&str>,
    implicit: bool,
    style: MappingStyle,
) -> Event {
    Event::mapping_start(anchor, tag, implicit, style)
}

/// Create a MAPPING-END event.
pub fn yaml_mapping_end_event_new() -> Event {
    Event::mapping_end()
}
