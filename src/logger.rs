use crate::container::Payload;

const CONFIG_FILE: &str = "log4rs.yaml";

#[ctor::ctor]
fn init() {
    if let Err(e) = log4rs::init_file(CONFIG_FILE, Default::default()) {
        eprintln!("Logging disabled, unable to load {}: {}", CONFIG_FILE, e);
    }
}

pub fn log_segment(index: usize, payload: &Payload, serialized_length: usize) {
    log::debug!(
        "Segment {:2} {:5} {:>8} bytes",
        index,
        payload.kind(),
        serialized_length
    );
}
