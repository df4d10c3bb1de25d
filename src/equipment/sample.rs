//! Canned equipment dataset for demos and tests.

use super::parser::parse_csv;
use super::types::EquipmentRecord;

/// File name recorded in history when the sample dataset is loaded.
pub const SAMPLE_FILE_NAME: &str = "sample_equipment_data.csv";

/// Ten pieces of plant equipment spanning six equipment types.
pub const SAMPLE_CSV: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature
Heat Exchanger 01,Exchanger,450.5,12.5,85.2
Distillation Column A,Tower,1200.0,4.2,165.0
Centrifugal Pump X,Pump,25.4,35.0,24.5
Valve BV-092,Valve,0.0,12.5,45.0
Storage Tank S1,Tank,0.0,1.0,18.5
Reflux Pump R1,Pump,15.8,28.2,55.0
Preheater H2,Exchanger,550.2,10.8,110.5
Safety Valve SV1,Valve,0.0,1.2,22.0
React Vessel R101,Reactor,800.0,25.0,220.0
Condenser C22,Exchanger,320.0,5.5,45.0";

/// Parse the sample dataset.
pub fn sample_records() -> Vec<EquipmentRecord> {
    parse_csv(SAMPLE_CSV)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_has_ten_records() {
        let records = sample_records();
        assert_eq!(records.len(), 10);
        assert_eq!(records[9].name, "Condenser C22");
        assert_eq!(records[9].id, "item-9");
    }

    #[test]
    fn test_sample_first_record() {
        let records = sample_records();
        let first = &records[0];
        assert_eq!(first.name, "Heat Exchanger 01");
        assert_eq!(first.equipment_type, "Exchanger");
        assert_eq!(first.flowrate, 450.5);
        assert_eq!(first.pressure, 12.5);
        assert_eq!(first.temperature, 85.2);
        assert!(first.extra.is_empty());
    }
}
