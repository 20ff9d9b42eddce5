/// Host objects: typed fields, read-only fields and function-backed accessors.
use pretty_assertions::assert_eq;
use pyattr::{
    ArgValues, AttrFailure, ClassBuilder, ExcType, Function, FunctionBody, HostObject, ResourceLimits, Session,
    Type, Value,
};

/// A host struct shaped like
///
/// ```text
/// MyStruct { __doc__: str (read-only), field1: int, field2: str, extra: any }
///   method first(self, a, b) -> a
///   property value -> "TestProperty"
///   property field1_copy -> self.field1
/// ```
fn my_struct(session: &mut Session) -> Value {
    let first = session.define_function(Function::new("first", 3, FunctionBody::ReturnArg(1)));
    let value = session.define_function(Function::new(
        "value",
        1,
        FunctionBody::Return(Value::from("TestProperty")),
    ));
    let field1_copy = session.define_function(Function::new(
        "field1_copy",
        1,
        FunctionBody::LoadAttr {
            arg: 0,
            attr: "field1".to_owned(),
        },
    ));
    session
        .new_host_object(
            HostObject::new("MyStruct")
                .read_only_field("__doc__", "this is a doc")
                .field("field1", 666)
                .field("field2", "test")
                .field("extra", Value::None)
                .method("first", first)
                .property("value", value)
                .property("field1_copy", field1_copy),
        )
        .unwrap()
}

// =============================================================================
// Fields
// =============================================================================

#[test]
fn fields_read_and_write() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);

    assert_eq!(session.get_attr(&obj, "__doc__").unwrap(), Value::from("this is a doc"));
    assert_eq!(session.get_attr(&obj, "field1").unwrap(), Value::Int(666));

    session.set_attr(&obj, "field1", 999).unwrap();
    assert_eq!(session.get_attr(&obj, "field1").unwrap(), Value::Int(999));
    session.set_attr(&obj, "field2", "changed").unwrap();
    assert_eq!(session.get_attr(&obj, "field2").unwrap(), Value::from("changed"));
}

/// Writing a read-only field fails and leaves the value alone.
#[test]
fn read_only_field_rejects_writes() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);

    let err = session.set_attr(&obj, "__doc__", "other").unwrap_err();
    assert_eq!(err.to_string(), "AttributeError: '__doc__' attribute is not settable");
    assert_eq!(
        err.failure(),
        Some(&AttrFailure::NotSettable {
            type_name: "MyStruct".to_owned(),
            attr: "__doc__".to_owned(),
        })
    );
    assert_eq!(session.get_attr(&obj, "__doc__").unwrap(), Value::from("this is a doc"));
}

/// A field keeps the type of its initial value.
#[test]
fn typed_field_rejects_other_types() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);

    let err = session.set_attr(&obj, "field1", "x").unwrap_err();
    assert!(err.is_exception_type(ExcType::TypeError));
    assert_eq!(err.to_string(), "TypeError: 'str' type is not assignable to 'int' type");
    assert_eq!(
        err.failure(),
        Some(&AttrFailure::NotAssignable {
            type_name: "MyStruct".to_owned(),
            attr: "field1".to_owned(),
            expected: "int".to_owned(),
            actual: "str".to_owned(),
        })
    );
    assert_eq!(session.get_attr(&obj, "field1").unwrap(), Value::Int(666));

    // instances report their class name
    let class = session.define_class(ClassBuilder::new("A")).unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();
    let err = session.set_attr(&obj, "field2", a.clone()).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: 'A' type is not assignable to 'str' type");

    // a field declared with no type accepts anything
    session.set_attr(&obj, "extra", a.clone()).unwrap();
    assert!(session.get_attr(&obj, "extra").unwrap().is(&a));
    session.set_attr(&obj, "extra", 1.5).unwrap();
    assert_eq!(session.get_attr(&obj, "extra").unwrap(), Value::Float(1.5));
}

/// An explicit declared type overrides the initial value's type.
#[test]
fn explicitly_typed_field() {
    let mut session = Session::new();
    let obj = session
        .new_host_object(HostObject::new("Holder").typed_field("count", Value::None, Some(Type::Int), true))
        .unwrap();

    session.set_attr(&obj, "count", 3).unwrap();
    let err = session.set_attr(&obj, "count", Value::None).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: 'NoneType' type is not assignable to 'int' type");
}

// =============================================================================
// Accessors
// =============================================================================

/// Method accessors bind the host object as the first argument.
#[test]
fn method_accessor_binds_to_the_object() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);

    let method = session.get_attr(&obj, "first").unwrap();
    assert_eq!(session.type_name(&method).unwrap(), "method");
    assert!(session.get_attr(&method, "__self__").unwrap().is(&obj));
    assert_eq!(
        session
            .call(&method, ArgValues::Two(Value::Int(100), Value::Int(666)))
            .unwrap(),
        Value::Int(100)
    );

    let err = session.call(&method, ArgValues::One(Value::Int(100))).unwrap_err();
    assert_eq!(
        err.to_string(),
        "TypeError: first() takes 3 positional arguments but 2 were given"
    );
}

/// Property accessors run on every read and see the object's current fields.
#[test]
fn property_accessor_is_called_on_read() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);

    assert_eq!(session.get_attr(&obj, "value").unwrap(), Value::from("TestProperty"));
    assert_eq!(session.get_attr(&obj, "field1_copy").unwrap(), Value::Int(666));
    session.set_attr(&obj, "field1", 1).unwrap();
    assert_eq!(session.get_attr(&obj, "field1_copy").unwrap(), Value::Int(1));
}

/// Accessors cannot be replaced.
#[test]
fn accessors_are_not_settable() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);

    let err = session.set_attr(&obj, "value", "x").unwrap_err();
    assert_eq!(err.to_string(), "AttributeError: 'value' attribute is not settable");
    let err = session.set_attr(&obj, "first", 1).unwrap_err();
    assert!(matches!(err.failure(), Some(AttrFailure::NotSettable { .. })));
}

// =============================================================================
// Missing attributes, deletion and calls
// =============================================================================

#[test]
fn unknown_attributes_are_missing() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);

    let err = session.get_attr(&obj, "nope").unwrap_err();
    assert_eq!(err.to_string(), "AttributeError: 'MyStruct' object has no attribute 'nope'");
    assert!(matches!(err.failure(), Some(AttrFailure::Missing { .. })));

    // no storage for new attributes
    let err = session.set_attr(&obj, "nope", 1).unwrap_err();
    assert!(matches!(err.failure(), Some(AttrFailure::Missing { .. })));
    assert!(session.get_attr(&obj, "nope").is_err());
}

/// The attribute surface is fixed: nothing can be deleted.
#[test]
fn attributes_cannot_be_deleted() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);

    let err = session.delete_attr(&obj, "field1").unwrap_err();
    assert_eq!(
        err.to_string(),
        "AttributeError: 'MyStruct' object attribute 'field1' cannot be deleted"
    );
    assert!(matches!(err.failure(), Some(AttrFailure::NotDeletable { .. })));
    let err = session.delete_attr(&obj, "first").unwrap_err();
    assert!(matches!(err.failure(), Some(AttrFailure::NotDeletable { .. })));

    let err = session.delete_attr(&obj, "nope").unwrap_err();
    assert!(matches!(err.failure(), Some(AttrFailure::Missing { .. })));
    assert_eq!(session.get_attr(&obj, "field1").unwrap(), Value::Int(666));
}

#[test]
fn host_object_is_not_callable() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);

    assert_eq!(session.type_name(&obj).unwrap(), "MyStruct");
    let err = session.call(&obj, ArgValues::Empty).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: 'MyStruct' object is not callable");
}

/// A host object stored on a class is a plain value: no binding, no descriptor hooks.
#[test]
fn host_object_as_class_attribute() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);
    let class = session.define_class(ClassBuilder::new("A").attr("config", obj.clone())).unwrap();
    let a = session.call(&class, ArgValues::Empty).unwrap();

    assert!(session.get_attr(&a, "config").unwrap().is(&obj));
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn host_objects_survive_save_load() {
    let mut session = Session::new();
    let obj = my_struct(&mut session);
    session.set_attr(&obj, "field1", 7).unwrap();
    assert_eq!(session.stats().objects_by_type.get("HostObject"), Some(&1));

    let bytes = session.save().unwrap();
    let mut loaded = Session::load(&bytes, ResourceLimits::new()).unwrap();
    assert_eq!(loaded.get_attr(&obj, "field1").unwrap(), Value::Int(7));
    assert_eq!(loaded.get_attr(&obj, "value").unwrap(), Value::from("TestProperty"));
    let err = loaded.set_attr(&obj, "field1", "x").unwrap_err();
    assert!(err.is_exception_type(ExcType::TypeError));
}
