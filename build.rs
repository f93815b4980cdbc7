fn main() {
    println!("cargo:rerun-if-env-changed=AIRVENT_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=AIRVENT_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=AIRVENT_TS_CHANNEL");
    println!("cargo:rerun-if-env-changed=AIRVENT_TS_FIELD");
    println!("cargo:rerun-if-env-changed=AIRVENT_TS_READ_KEY");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
