// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parse, dereference and transform a small railway file

use ifc_step_model::{AttributeContainer, EntityId, EntityResolver, IfcError};
use ifc_step_parser::{parse_ifc_str, StepParser};
use ifc_step_transform::{
    Domain, TableLookup, TemplateContext, TransformError, TransformTemplate, Transformer,
};

const SIMPLE: &str = "FOO;\nHEADER;\nENDSEC;\nDATA;\n#1 = BAR('x',1.5,$);\n#2 = BAZ(#1);\nENDSEC;\nEND-FOO;";

const TRACK_FILE: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [ReferenceView]'),'2;1');
FILE_NAME('line-001.ifc','2024-03-01T08:00:00',('Planner'),('Rail Co'),'exporter 2.1','Designer',$);
FILE_SCHEMA(('IFC4X3_ADD2'));
ENDSEC;

DATA;
#10 = IFCCARTESIANPOINT((0.,0.,0.));
#11 = IFCCARTESIANPOINT((125.250,3.5E1,0.));
#20 = IFCPOLYLINE((#10,#11));
#30 = TRACKSEGMENT('Segment, north',1435,(#20),.MAIN.,'M-7',$);
#31 = TRACKSEGMENT('Segment ''B''',1524,(#20),.SIDING.,'M-9',$);
ENDSEC;
END-ISO-10303-21;
"#;

const RAIL_DOMAIN: &str = r#"{
    "name": "Rail",
    "version": "2.0",
    "classifications": [
        {"name": "Infrastructure", "code": "INF"},
        {
            "name": "Track segment",
            "code": "TRK",
            "parentCode": "INF",
            "propertySets": [
                {"name": "Identity", "properties": [
                    {"name": "Name", "code": "NAM"}
                ]},
                {"name": "Pset_Track", "properties": [
                    {"name": "Gauge", "code": "GAU", "dataType": "IfcPositiveLengthMeasure"},
                    {"name": "Axis", "code": "AXS"},
                    {"name": "Kind", "code": "KND", "allowedValues": ["MAIN", "SIDING"]},
                    {"name": "Material", "code": "MAT"},
                    {"name": "Remarks", "code": "REM"}
                ]}
            ]
        }
    ]
}"#;

#[test]
fn scenario_parse_simple_file() {
    let ifc = parse_ifc_str(SIMPLE).unwrap();
    let bar = ifc.entity(EntityId(1)).unwrap();
    assert_eq!(bar.name, "BAR");
    assert_eq!(bar.to_string(), "BAR('x',1.5,$)");
}

#[test]
fn scenario_dereference_reference() {
    let ifc = parse_ifc_str(SIMPLE).unwrap();
    let baz = ifc.dereference_entity(EntityId(2)).unwrap();
    assert_eq!(baz.get_entity(&[0]).unwrap().name, "BAR");
    assert_eq!(baz.to_string(), "BAZ(BAR('x',1.5,$))");
}

#[test]
fn scenario_default_json_transform() {
    let ifc = parse_ifc_str(SIMPLE).unwrap();
    let template = TransformTemplate::compile(r#"{"v":"${0}"}"#, &TemplateContext::new()).unwrap();
    assert_eq!(
        Transformer::new(template).transform(&ifc, EntityId(1)).unwrap(),
        r#"{"v":"x"}"#
    );
}

#[test]
fn scenario_json_list_transform() {
    let ifc = parse_ifc_str(SIMPLE).unwrap();
    let template =
        TransformTemplate::compile(r#"{"v":"${JSON_LIST:0,1}"}"#, &TemplateContext::new()).unwrap();
    assert_eq!(
        Transformer::new(template).transform(&ifc, EntityId(1)).unwrap(),
        r#"{"v":["x",1.5]}"#
    );
}

#[test]
fn scenario_missing_terminator() {
    let content = "FOO;\nHEADER;\nENDSEC;\nDATA;\n#1 = BAR('x')\nENDSEC;\nEND-FOO;";
    assert!(matches!(
        parse_ifc_str(content),
        Err(IfcError::MalformedLine(_))
    ));
}

#[test]
fn track_file_metadata() {
    let parser = StepParser::new();
    let ifc = parser.parse_str(TRACK_FILE).unwrap();
    assert_eq!(ifc.data.len(), 5);
    assert_eq!(ifc.count_by_name().get("TRACKSEGMENT"), Some(&2));

    let info = parser.metadata(&ifc);
    assert_eq!(info.schema_version(), Some("IFC4X3_ADD2"));
    assert_eq!(info.author.as_deref(), Some("Planner"));
}

#[test]
fn classified_transform_of_track_segments() {
    let domain = Domain::from_json(RAIL_DOMAIN).unwrap();
    let track = domain.classification("TRK").unwrap().clone();
    assert_eq!(domain.parent_of(&track).unwrap().name, "Infrastructure");

    let context = TemplateContext::new()
        .with_classification(track)
        .with_lookup(
            "MATERIAL",
            TableLookup::new("MATERIAL")
                .with_entry("M-7", "UIC 60")
                .with_entry("M-9", "S 49"),
        );
    let template = TransformTemplate::compile(
        r#"{
            "name": "${Identity.Name}",
            "gauge": "${Pset_Track.Gauge}",
            "kind": "${Pset_Track.Kind}",
            "material": "${MATERIAL:Pset_Track.Material}",
            "start": "${JSON_LIST:Pset_Track.Axis.0.0.0.0,Pset_Track.Axis.0.0.1.0}",
            "axis": "${RAW_STEP:Pset_Track.Axis}",
            "remarks": "${Pset_Track.Remarks}"
        }"#,
        &context,
    )
    .unwrap();

    let ifc = parse_ifc_str(TRACK_FILE).unwrap();
    let results = Transformer::new(template)
        .transform_all(&ifc, "TRACKSEGMENT")
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, EntityId(30));
    assert_eq!(
        results[0].1,
        concat!(
            r#"{"name":"Segment, north","gauge":1435,"kind":"MAIN","material":"UIC 60","#,
            r#""start":[[0,0,0],[125.25,35,0]],"#,
            r#""axis":"(IFCPOLYLINE((IFCCARTESIANPOINT((0,0,0)),IFCCARTESIANPOINT((125.250,35,0)))))","#,
            r#""remarks":null}"#
        )
    );
    assert!(results[1].1.starts_with(r#"{"name":"Segment 'B'","gauge":1524,"kind":"SIDING","material":"S 49""#));
}

#[test]
fn exporter_direction_ratios_become_json_numbers() {
    let content = SIMPLE.replace(
        "ENDSEC;\nEND",
        "#3 = IFCDIRECTION((6.12323399573677E-17,1.E30,0.));\nENDSEC;\nEND",
    );
    let ifc = parse_ifc_str(&content).unwrap();
    let template = TransformTemplate::compile(r#"{"ratios":"${0}"}"#, &TemplateContext::new()).unwrap();
    let json = Transformer::new(template).transform(&ifc, EntityId(3)).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let ratios = value["ratios"].as_array().unwrap();
    assert_eq!(ratios.len(), 3);
    assert!(ratios.iter().all(|r| r.is_number()));
    assert!((ratios[0].as_f64().unwrap() - 6.12323399573677e-17).abs() < 1e-30);
    assert!((ratios[1].as_f64().unwrap() / 1e30 - 1.0).abs() < 1e-12);
    assert_eq!(ratios[2], serde_json::json!(0));
}

#[test]
fn transform_of_cyclic_graph_fails() {
    let content = "FOO;\nHEADER;\nENDSEC;\nDATA;\n#1 = A(#2);\n#2 = B(#1);\nENDSEC;\nEND-FOO;";
    let ifc = parse_ifc_str(content).unwrap();
    let template = TransformTemplate::compile(r#"{"v":"${RAW_STEP:0}"}"#, &TemplateContext::new()).unwrap();
    assert!(matches!(
        Transformer::new(template).transform(&ifc, EntityId(1)),
        Err(TransformError::Ifc(IfcError::CyclicReference(EntityId(1))))
    ));
}
