use simple_ssdp::SsdpEvent;
use simple_ssdp::SsdpRecord;

pub fn print_event(event: &SsdpEvent, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        SsdpEvent::Discover(record) => println!("discover {}", describe(record)),
        SsdpEvent::Notify(record) => println!("notify {}", describe(record)),
        SsdpEvent::Error(message) => eprintln!("error {}", message),
    }
    Ok(())
}

fn describe(record: &SsdpRecord) -> String {
    format!(
        "from={} usn={} location={}",
        record.remote.socket_address(),
        record.header("usn").unwrap_or("-"),
        record.header("location").unwrap_or("-")
    )
}
