//! Tree-walking evaluator.
//!
//! Execution is plain recursion over the AST; non-local control flow
//! (`return`, `break`/`continue`, exceptions) rides the sentinel `Value`
//! variants from `value.rs` rather than Rust-level `Result`/`?` unwinding —
//! `?` is reserved for the `InternalAbort` path (internal invariant
//! violations abort evaluation immediately, rather than being catchable).

use std::rc::Rc;

use ahash::AHashMap;

use crate::ast::{
    BinaryOp, Decl, Expr, ExprId, FieldDecl, LiteralValue, Program, SizeofOperand, Stmt, StmtId, UnaryOp,
};
use crate::diagnostics::{DiagnosticKind, ErrorCollector};
use crate::environment::Environment;
use crate::intrinsics;
use crate::io::{InputReader, PrintWriter};
use crate::resource::ResourceTracker;
use crate::value::{Capabilities, ClassDef, Closure, EvalResult, InternalAbort, ObjectDef, ObjectInstance, StructDef, Value};

pub enum RunOutcome {
    /// `main` returned normally; the carried value is its (unwrapped) result.
    Completed(Value),
    /// An exception escaped `main` uncaught (the host reports it, exit code -2).
    UncaughtException(Value),
    /// No `main()` function was declared.
    NoEntryPoint,
}

pub struct Evaluator<'p, 'h> {
    program: &'p Program,
    globals: Environment,
    classes: AHashMap<String, Rc<ClassDef>>,
    structs: AHashMap<String, Rc<StructDef>>,
    print: &'h mut dyn PrintWriter,
    input: &'h mut dyn InputReader,
    tracker: &'h dyn ResourceTracker,
    errors: &'h mut ErrorCollector,
}

/// Runs a whole compilation unit: registers top-level declarations, then
/// calls `main()` with no arguments.
pub fn run(
    program: &Program,
    errors: &mut ErrorCollector,
    print: &mut dyn PrintWriter,
    input: &mut dyn InputReader,
    tracker: &dyn ResourceTracker,
) -> Result<RunOutcome, InternalAbort> {
    let mut eval = Evaluator {
        program,
        globals: Environment::root(),
        classes: AHashMap::default(),
        structs: AHashMap::default(),
        print,
        input,
        tracker,
        errors,
    };
    eval.register_declarations(&program.declarations)?;
    let Some(main_fn) = eval.globals.get("main") else {
        return Ok(RunOutcome::NoEntryPoint);
    };
    let Value::Function(closure) = main_fn else {
        return Ok(RunOutcome::NoEntryPoint);
    };
    let result = eval.call_closure(&closure, Vec::new())?;
    Ok(match result {
        Value::ExceptionCarrier(payload) => RunOutcome::UncaughtException(*payload),
        Value::ReturnCarrier(payload) => RunOutcome::Completed(*payload),
        other => RunOutcome::Completed(other),
    })
}

impl<'p, 'h> Evaluator<'p, 'h> {
    fn register_declarations(&mut self, decls: &[crate::ast::DeclId]) -> Result<(), InternalAbort> {
        for &id in decls {
            match self.program.decls.get(id).clone() {
                Decl::Function(f) => {
                    let closure = Rc::new(Closure { decl: id, captured_env: self.globals.clone() });
                    self.globals.define(f.name.clone(), Value::Function(closure));
                }
                Decl::Struct(s) => {
                    let def = Rc::new(StructDef {
                        name: s.name.clone(),
                        field_names: s.fields.iter().map(|f| f.name.clone()).collect(),
                    });
                    self.structs.insert(s.name.clone(), def);
                }
                Decl::Class(c) => {
                    let def = self.build_class(&c.name);
                    if let Some(def) = def {
                        self.globals.define(c.name.clone(), Value::Class(def));
                    }
                }
                Decl::Object(o) => {
                    // A bare top-level `object` is modeled as
                    // a class with no parent and no fields: its methods are
                    // callable the same way a class's are.
                    let mut methods = AHashMap::default();
                    for &m in &o.methods {
                        if let Decl::Function(f) = self.program.decls.get(m) {
                            methods.insert(f.name.clone(), m);
                        }
                    }
                    let capabilities = capabilities_from_methods(&methods);
                    let def = Rc::new(ClassDef {
                        name: o.name.clone(),
                        parent: None,
                        field_defaults: o.fields.iter().map(|f| (f.name.clone(), f.init)).collect(),
                        methods,
                        nested_objects: AHashMap::default(),
                        capabilities,
                    });
                    self.classes.insert(o.name.clone(), Rc::clone(&def));
                    self.globals.define(o.name.clone(), Value::Class(def));
                }
                Decl::Namespace(ns) => {
                    self.register_declarations(&ns.declarations)?;
                }
                Decl::Typedef { .. } | Decl::Import { .. } | Decl::UsingDirective { .. } => {}
            }
        }
        Ok(())
    }

    /// Builds (and memoizes) a `ClassDef`, resolving the parent by name
    /// regardless of declaration order — names, not pointers, cross
    /// declarations, so forward references between classes just work.
    fn build_class(&mut self, name: &str) -> Option<Rc<ClassDef>> {
        if let Some(existing) = self.classes.get(name) {
            return Some(Rc::clone(existing));
        }
        let decl_id = self.program.declarations.iter().copied().find(|&id| {
            matches!(self.program.decls.get(id), Decl::Class(c) if c.name == name)
        })?;
        let Decl::Class(cd) = self.program.decls.get(decl_id).clone() else {
            unreachable!()
        };
        let parent = cd.parent.as_ref().and_then(|p| self.build_class(p));
        let mut methods = AHashMap::default();
        for &m in &cd.methods {
            if let Decl::Function(f) = self.program.decls.get(m) {
                methods.insert(f.name.clone(), m);
            }
        }
        let mut nested_objects = AHashMap::default();
        for obj in &cd.nested_objects {
            let mut obj_methods = AHashMap::default();
            for &m in &obj.methods {
                if let Decl::Function(f) = self.program.decls.get(m) {
                    obj_methods.insert(f.name.clone(), m);
                    // Nested-object methods are also visible through the
                    // owning class's flat method table: `X.Name.method()`
                    // and `X.method()` both resolve the same definition
                    // namespace qualifiers.
                    methods.entry(f.name.clone()).or_insert(m);
                }
            }
            nested_objects.insert(
                obj.name.clone(),
                Rc::new(ObjectDef { name: obj.name.clone(), overrides: obj.overrides.clone(), methods: obj_methods }),
            );
        }
        let capabilities = capabilities_from_methods(&methods);
        let field_defaults = cd.fields.iter().map(|f: &FieldDecl| (f.name.clone(), f.init)).collect();
        let class_def = Rc::new(ClassDef { name: name.to_string(), parent, field_defaults, methods, nested_objects, capabilities });
        self.classes.insert(name.to_string(), Rc::clone(&class_def));
        Some(class_def)
    }

    // ---- statements ------------------------------------------------

    /// Executes a statement list in a fresh child scope, running `__exit`
    /// for any `Object` bound directly in this block, in reverse binding
    /// order.
    fn exec_block(&mut self, stmts: &[StmtId], env: &Environment) -> EvalResult {
        let block_env = env.child();
        let mut bound_objects: Vec<(String, Rc<ObjectInstance>)> = Vec::new();
        let mut result = Value::Nil;
        for &stmt_id in stmts {
            let is_var_decl = matches!(self.program.stmts.get(stmt_id), Stmt::VariableDecl { .. });
            let decl_name = if is_var_decl {
                let Stmt::VariableDecl { name, .. } = self.program.stmts.get(stmt_id) else { unreachable!() };
                Some(name.clone())
            } else {
                None
            };
            result = self.exec_stmt(stmt_id, &block_env)?;
            if let Some(name) = decl_name {
                if let Some(Value::Object(obj)) = block_env.get(&name) {
                    bound_objects.push((name, obj));
                }
            }
            if result.is_sentinel() {
                break;
            }
        }
        self.run_exit_hooks(bound_objects, &block_env)?;
        Ok(result)
    }

    fn run_exit_hooks(&mut self, bound: Vec<(String, Rc<ObjectInstance>)>, env: &Environment) -> EvalResult {
        for (_name, obj) in bound.into_iter().rev() {
            if !obj.class.capabilities.exit || *obj.exited.borrow() {
                continue;
            }
            *obj.exited.borrow_mut() = true;
            if let Some(method) = obj.class.resolve_method("__exit") {
                let outcome = self.call_method(Rc::clone(&obj), method, Vec::new(), env)?;
                if let Value::ExceptionCarrier(payload) = outcome {
                    // "`__exit` is not allowed to throw; exceptions raised
                    // in `__exit` are logged and suppressed rather than re-raised.
                    self.errors.push(crate::diagnostics::Diagnostic::new(
                        crate::diagnostics::Severity::Warning,
                        DiagnosticKind::Internal,
                        format!("exception suppressed in __exit: {payload}"),
                        None,
                    ));
                }
            }
        }
        Ok(Value::Nil)
    }

    fn exec_stmt(&mut self, id: StmtId, env: &Environment) -> EvalResult {
        let stmt = self.program.stmts.get(id).clone();
        match stmt {
            Stmt::Expression(e) => self.eval_expr(e, env),
            Stmt::Block(stmts) => self.exec_block(&stmts, env),
            Stmt::VariableDecl { name, init, .. } => {
                let value = match init {
                    Some(e) => {
                        let v = self.eval_expr(e, env)?;
                        if v.is_sentinel() {
                            return Ok(v);
                        }
                        v
                    }
                    None => Value::Nil,
                };
                env.define(name, value);
                Ok(Value::Nil)
            }
            Stmt::If { cond, then_branch, else_branch } => {
                let c = self.eval_expr(cond, env)?;
                if c.is_sentinel() {
                    return Ok(c);
                }
                if c.is_truthy() {
                    self.exec_stmt(then_branch, env)
                } else if let Some(eb) = else_branch {
                    self.exec_stmt(eb, env)
                } else {
                    Ok(Value::Nil)
                }
            }
            Stmt::While { cond, body } => {
                loop {
                    let c = self.eval_expr(cond, env)?;
                    if c.is_sentinel() {
                        return Ok(c);
                    }
                    if !c.is_truthy() {
                        break;
                    }
                    let r = self.exec_stmt(body, env)?;
                    match r {
                        Value::LoopSignal(true) => break,
                        Value::LoopSignal(false) => continue,
                        v if v.is_sentinel() => return Ok(v),
                        _ => {}
                    }
                }
                Ok(Value::Nil)
            }
            Stmt::DoWhile { body, cond } => {
                loop {
                    let r = self.exec_stmt(body, env)?;
                    match r {
                        Value::LoopSignal(true) => break,
                        Value::LoopSignal(false) => {}
                        v if v.is_sentinel() => return Ok(v),
                        _ => {}
                    }
                    let c = self.eval_expr(cond, env)?;
                    if c.is_sentinel() {
                        return Ok(c);
                    }
                    if !c.is_truthy() {
                        break;
                    }
                }
                Ok(Value::Nil)
            }
            Stmt::For { init, cond, step, body } => {
                let loop_env = env.child();
                if let Some(init) = init {
                    let r = self.exec_stmt(init, &loop_env)?;
                    if r.is_sentinel() {
                        return Ok(r);
                    }
                }
                loop {
                    if let Some(cond) = cond {
                        let c = self.eval_expr(cond, &loop_env)?;
                        if c.is_sentinel() {
                            return Ok(c);
                        }
                        if !c.is_truthy() {
                            break;
                        }
                    }
                    let r = self.exec_stmt(body, &loop_env)?;
                    match r {
                        Value::LoopSignal(true) => break,
                        Value::LoopSignal(false) => {}
                        v if v.is_sentinel() => return Ok(v),
                        _ => {}
                    }
                    if let Some(step) = step {
                        let s = self.eval_expr(step, &loop_env)?;
                        if s.is_sentinel() {
                            return Ok(s);
                        }
                    }
                }
                Ok(Value::Nil)
            }
            Stmt::ForEach { var, iter, body } => {
                let iterable = self.eval_expr(iter, env)?;
                if iterable.is_sentinel() {
                    return Ok(iterable);
                }
                let Value::Array(items) = iterable else {
                    return Ok(Value::exception_carrier(
                        DiagnosticKind::Type,
                        "foreach target is not an array",
                        Some(self.program.stmt_range(id)),
                    ));
                };
                let snapshot: Vec<Value> = items.borrow().clone();
                for item in snapshot {
                    let loop_env = env.child();
                    loop_env.define(var.clone(), item);
                    let r = self.exec_stmt(body, &loop_env)?;
                    match r {
                        Value::LoopSignal(true) => break,
                        Value::LoopSignal(false) => continue,
                        v if v.is_sentinel() => return Ok(v),
                        _ => {}
                    }
                }
                Ok(Value::Nil)
            }
            Stmt::Return(e) => {
                let value = match e {
                    Some(e) => {
                        let v = self.eval_expr(e, env)?;
                        if v.is_sentinel() {
                            return Ok(v);
                        }
                        v
                    }
                    None => Value::Nil,
                };
                Ok(Value::ReturnCarrier(Box::new(value)))
            }
            Stmt::Break => Ok(Value::LoopSignal(true)),
            Stmt::Continue => Ok(Value::LoopSignal(false)),
            Stmt::Throw(e) => {
                let v = self.eval_expr(e, env)?;
                if v.is_sentinel() {
                    return Ok(v);
                }
                Ok(Value::ExceptionCarrier(Box::new(v)))
            }
            Stmt::TryCatch { try_block, catch_var, catch_body, .. } => {
                let r = self.exec_stmt(try_block, env)?;
                if let Value::ExceptionCarrier(payload) = r {
                    let catch_env = env.child();
                    catch_env.define(catch_var, *payload);
                    self.exec_stmt(catch_body, &catch_env)
                } else {
                    Ok(r)
                }
            }
            Stmt::Asm(_payload) => Ok(Value::exception_carrier(
                DiagnosticKind::Unimplemented,
                "asm blocks require an embedding host handler",
                Some(self.program.stmt_range(id)),
            )),
            Stmt::Switch { scrutinee, cases, default } => {
                let v = self.eval_expr(scrutinee, env)?;
                if v.is_sentinel() {
                    return Ok(v);
                }
                for case in &cases {
                    let case_val = self.eval_expr(case.value, env)?;
                    if case_val.is_sentinel() {
                        return Ok(case_val);
                    }
                    if values_equal(&v, &case_val) {
                        return self.exec_block(&case.body, env);
                    }
                }
                if let Some(default) = default {
                    return self.exec_block(&default, env);
                }
                Ok(Value::Nil)
            }
            Stmt::Assert(e) => {
                let v = self.eval_expr(e, env)?;
                if v.is_sentinel() {
                    return Ok(v);
                }
                if v.is_truthy() {
                    Ok(Value::Nil)
                } else {
                    Ok(Value::exception_carrier(
                        DiagnosticKind::Internal,
                        "assertion failed",
                        Some(self.program.stmt_range(id)),
                    ))
                }
            }
        }
    }

    // ---- expressions -----------------------------------------------

    fn eval_expr(&mut self, id: ExprId, env: &Environment) -> EvalResult {
        let range = self.program.expr_range(id);
        let expr = self.program.exprs.get(id).clone();
        match expr {
            Expr::Literal(lit) => Ok(literal_value(&lit)),
            Expr::Variable(name) => Ok(env.get(&name).unwrap_or_else(|| {
                Value::exception_carrier(DiagnosticKind::NameResolution, format!("undefined name '{name}'"), Some(range))
            })),
            Expr::Binary { op, left, right } => self.eval_binary(op, left, right, env, range),
            Expr::Unary { op, operand } => self.eval_unary(op, operand, env, range),
            Expr::Call { callee, args } => self.eval_call(callee, &args, env),
            Expr::Index { array, index } => self.eval_index(array, index, env, range),
            Expr::Member { object, name } => self.eval_member(object, &name, env, range),
            Expr::ArrowMember { pointer, name } => {
                let p = self.eval_expr(pointer, env)?;
                if p.is_sentinel() {
                    return Ok(p);
                }
                let Value::Pointer(cell) = p else {
                    return Ok(Value::exception_carrier(DiagnosticKind::Type, "'->' target is not a pointer", Some(range)));
                };
                self.access_member(cell.borrow().clone(), &name, range)
            }
            Expr::ScopeResolve { path } => Ok(env.get(&path.join("::")).or_else(|| env.get(path.last().unwrap())).unwrap_or_else(|| {
                Value::exception_carrier(DiagnosticKind::NameResolution, format!("undefined name '{}'", path.join("::")), Some(range))
            })),
            Expr::ArrayLiteral(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for e in elements {
                    let v = self.eval_expr(e, env)?;
                    if v.is_sentinel() {
                        return Ok(v);
                    }
                    values.push(v);
                }
                Ok(Value::array(values))
            }
            Expr::IString { format_parts, args } => self.eval_istring(&format_parts, &args, env, range),
            Expr::Cast { target, operand } => {
                let v = self.eval_expr(operand, env)?;
                if v.is_sentinel() {
                    return Ok(v);
                }
                Ok(self.coerce_to_type(v, target))
            }
            Expr::Sizeof(operand) => Ok(self.eval_sizeof(operand, env)?),
            Expr::Typeof(e) => {
                let v = self.eval_expr(e, env)?;
                if v.is_sentinel() {
                    return Ok(v);
                }
                Ok(Value::string(v.type_name()))
            }
            Expr::Assign { op, target, value } => self.eval_assign(op, target, value, env, range),
            Expr::Ternary { cond, then_branch, else_branch } => {
                let c = self.eval_expr(cond, env)?;
                if c.is_sentinel() {
                    return Ok(c);
                }
                if c.is_truthy() {
                    self.eval_expr(then_branch, env)
                } else {
                    self.eval_expr(else_branch, env)
                }
            }
            Expr::AddressOf(inner) => self.eval_address_of(inner, env, range),
            Expr::Dereference(inner) => {
                let v = self.eval_expr(inner, env)?;
                if v.is_sentinel() {
                    return Ok(v);
                }
                match v {
                    Value::Pointer(cell) => Ok(cell.borrow().clone()),
                    _ => Ok(Value::exception_carrier(DiagnosticKind::Type, "cannot dereference a non-pointer value", Some(range))),
                }
            }
            Expr::Instantiate { class, args } => self.eval_instantiate(class, &args, env, range),
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId, env: &Environment, range: crate::source::SourceRange) -> EvalResult {
        let l = self.eval_expr(left, env)?;
        if l.is_sentinel() {
            return Ok(l);
        }
        if matches!(op, BinaryOp::And) {
            if !l.is_truthy() {
                return Ok(l);
            }
            return self.eval_expr(right, env);
        }
        if matches!(op, BinaryOp::Or) {
            if l.is_truthy() {
                return Ok(l);
            }
            return self.eval_expr(right, env);
        }
        let r = self.eval_expr(right, env)?;
        if r.is_sentinel() {
            return Ok(r);
        }
        if let Some(result) = self.try_magic_binary(op, &l, &r, env)? {
            return Ok(result);
        }
        Ok(apply_binary(op, l, r, range))
    }

    /// Consults the left operand's `Capabilities` before the native
    /// fallback.
    fn try_magic_binary(&mut self, op: BinaryOp, l: &Value, r: &Value, env: &Environment) -> Result<Option<Value>, InternalAbort> {
        let Value::Object(obj) = l else { return Ok(None) };
        let method_name = match op {
            BinaryOp::Add if obj.class.capabilities.add => "__add",
            BinaryOp::Sub if obj.class.capabilities.sub => "__sub",
            BinaryOp::Mul if obj.class.capabilities.mul => "__mul",
            BinaryOp::Div if obj.class.capabilities.div => "__div",
            BinaryOp::Eq if obj.class.capabilities.eq => "__eq",
            BinaryOp::Lt if obj.class.capabilities.lt => "__lt",
            _ => return Ok(None),
        };
        let Some(method) = obj.class.resolve_method(method_name) else { return Ok(None) };
        let result = self.call_method(Rc::clone(obj), method, vec![r.clone()], env)?;
        Ok(Some(result))
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: ExprId, env: &Environment, range: crate::source::SourceRange) -> EvalResult {
        match op {
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                let Some(cell) = self.lvalue_cell(operand, env)? else {
                    return Ok(Value::exception_carrier(DiagnosticKind::Type, "increment/decrement target is not an l-value", Some(range)));
                };
                let old = cell.borrow().clone();
                let delta = if matches!(op, UnaryOp::PreInc | UnaryOp::PostInc) { 1 } else { -1 };
                let new_val = apply_binary(BinaryOp::Add, old.clone(), Value::int(delta), range);
                *cell.borrow_mut() = new_val.clone();
                Ok(if matches!(op, UnaryOp::PreInc | UnaryOp::PreDec) { new_val } else { old })
            }
            _ => {
                let v = self.eval_expr(operand, env)?;
                if v.is_sentinel() {
                    return Ok(v);
                }
                Ok(match op {
                    UnaryOp::Neg => match v {
                        Value::Int { value, bits, signed } => Value::Int { value: -value, bits, signed },
                        Value::Float { value, bits } => Value::Float { value: -value, bits },
                        _ => Value::exception_carrier(DiagnosticKind::Type, "'-' requires a numeric operand", Some(range)),
                    },
                    UnaryOp::Not => Value::Bool(!v.is_truthy()),
                    UnaryOp::BitNot => match v {
                        Value::Int { value, bits, signed } => Value::Int { value: !value, bits, signed },
                        _ => Value::exception_carrier(DiagnosticKind::Type, "'~' requires an integer operand", Some(range)),
                    },
                    UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => unreachable!(),
                })
            }
        }
    }

    fn eval_index(&mut self, array: ExprId, index: ExprId, env: &Environment, range: crate::source::SourceRange) -> EvalResult {
        let a = self.eval_expr(array, env)?;
        if a.is_sentinel() {
            return Ok(a);
        }
        let i = self.eval_expr(index, env)?;
        if i.is_sentinel() {
            return Ok(i);
        }
        let Value::Int { value: idx, .. } = i else {
            return Ok(Value::exception_carrier(DiagnosticKind::Type, "array index must be an integer", Some(range)));
        };
        match a {
            Value::Array(items) => {
                let items = items.borrow();
                if idx < 0 || idx as usize >= items.len() {
                    Ok(Value::exception_carrier(DiagnosticKind::Index, format!("index {idx} out of range"), Some(range)))
                } else {
                    Ok(items[idx as usize].clone())
                }
            }
            _ => Ok(Value::exception_carrier(DiagnosticKind::Type, "indexing target is not an array", Some(range))),
        }
    }

    fn eval_member(&mut self, object: ExprId, name: &str, env: &Environment, range: crate::source::SourceRange) -> EvalResult {
        let v = self.eval_expr(object, env)?;
        if v.is_sentinel() {
            return Ok(v);
        }
        self.access_member(v, name, range)
    }

    /// Field/method lookup on an `Object`, field lookup on a `Struct`, or a
    /// transparent namespace qualifier otherwise (`Class.NestedObjectName`,
    /// `obj.NestedObjectName`) — see DESIGN.md on the nested-object-access
    /// open question.
    fn access_member(&mut self, v: Value, name: &str, range: crate::source::SourceRange) -> EvalResult {
        match v {
            Value::Object(obj) => {
                if let Some(field) = obj.fields.borrow().get(name) {
                    return Ok(field.clone());
                }
                if obj.class.resolve_method(name).is_some() || obj.class.nested_objects.contains_key(name) {
                    // Either a method name (bound for the caller's
                    // subsequent `Call`) or a nested-object qualifier: both
                    // are represented by handing back the same instance, so
                    // a following `.method()`/`.Nested.method()` still
                    // resolves through `resolve_method`.
                    return Ok(Value::Object(obj));
                }
                Ok(Value::exception_carrier(DiagnosticKind::NameResolution, format!("no member '{name}' on object"), Some(range)))
            }
            Value::Struct(s) => s
                .fields
                .borrow()
                .get(name)
                .cloned()
                .map_or_else(|| Ok(Value::exception_carrier(DiagnosticKind::NameResolution, format!("no field '{name}' on struct"), Some(range))), Ok),
            Value::Class(class) => {
                if class.resolve_method(name).is_some() || class.has_nested_object(name) {
                    Ok(Value::Class(class))
                } else {
                    Ok(Value::exception_carrier(
                        DiagnosticKind::NameResolution,
                        format!("no member '{name}' on class '{}'", class.name),
                        Some(range),
                    ))
                }
            }
            _ => Ok(Value::exception_carrier(DiagnosticKind::Type, format!("cannot access member '{name}' on a {}", v.type_name()), Some(range))),
        }
    }

    fn eval_istring(&mut self, format_parts: &[String], args: &[ExprId], env: &Environment, range: crate::source::SourceRange) -> EvalResult {
        let format = format_parts.first().cloned().unwrap_or_default();
        let mut values = Vec::with_capacity(args.len());
        for &a in args {
            let v = self.eval_expr(a, env)?;
            if v.is_sentinel() {
                return Ok(v);
            }
            values.push(v);
        }
        let mut out = String::with_capacity(format.len());
        let mut arg_iter = values.into_iter();
        let mut chars = format.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '{' && chars.peek() == Some(&'}') {
                chars.next();
                match arg_iter.next() {
                    Some(v) => out.push_str(&self.stringify(&v, env)?),
                    None => {
                        return Ok(Value::exception_carrier(
                            DiagnosticKind::Arity,
                            "interpolated string has more placeholders than arguments",
                            Some(range),
                        ))
                    }
                }
            } else {
                out.push(c);
            }
        }
        Ok(Value::string(out))
    }

    /// Calls `__expr` on Objects that implement it; identity conversion on
    /// primitives otherwise.
    fn stringify(&mut self, v: &Value, env: &Environment) -> Result<String, InternalAbort> {
        if let Value::Object(obj) = v {
            if obj.class.capabilities.expr {
                if let Some(method) = obj.class.resolve_method("__expr") {
                    let result = self.call_method(Rc::clone(obj), method, Vec::new(), env)?;
                    return Ok(result.to_string());
                }
            }
        }
        Ok(v.to_string())
    }

    fn eval_sizeof(&mut self, operand: SizeofOperand, env: &Environment) -> EvalResult {
        match operand {
            SizeofOperand::Expr(e) => {
                let v = self.eval_expr(e, env)?;
                if v.is_sentinel() {
                    return Ok(v);
                }
                Ok(Value::int(approximate_size_of(&v)))
            }
            SizeofOperand::Type(ty) => Ok(Value::int(approximate_size_of_type(self.program, ty))),
        }
    }

    fn coerce_to_type(&self, v: Value, target: crate::ast::TypeId) -> Value {
        match (self.program.types.get(target), &v) {
            (crate::ast::TypeExpr::Int { bits, signed }, Value::Int { value, .. }) => {
                Value::Int { value: *value, bits: *bits, signed: *signed }
            }
            (crate::ast::TypeExpr::Int { bits, signed }, Value::Float { value, .. }) => {
                Value::Int { value: *value as i64, bits: *bits, signed: *signed }
            }
            (crate::ast::TypeExpr::Float { bits }, Value::Int { value, .. }) => Value::Float { value: *value as f64, bits: *bits },
            (crate::ast::TypeExpr::Float { bits }, Value::Float { value, .. }) => Value::Float { value: *value, bits: *bits },
            (crate::ast::TypeExpr::String, _) => Value::string(v.to_string()),
            _ => v,
        }
    }

    /// Assignment targets fall into two shapes: a shared `Cell` (variables,
    /// `*ptr`), handled through `lvalue_cell`, or a map slot (an object's or
    /// struct's field, an array element) mutated in place here since those
    /// aren't backed by individual `Rc<RefCell<_>>` cells.
    fn eval_assign(&mut self, op: Option<BinaryOp>, target: ExprId, value: ExprId, env: &Environment, range: crate::source::SourceRange) -> EvalResult {
        let rhs = self.eval_expr(value, env)?;
        if rhs.is_sentinel() {
            return Ok(rhs);
        }
        match self.program.exprs.get(target).clone() {
            Expr::Member { object, name } => {
                let obj_val = self.eval_expr(object, env)?;
                if obj_val.is_sentinel() {
                    return Ok(obj_val);
                }
                self.assign_field(obj_val, &name, op, rhs, range)
            }
            Expr::ArrowMember { pointer, name } => {
                let p = self.eval_expr(pointer, env)?;
                if p.is_sentinel() {
                    return Ok(p);
                }
                let Value::Pointer(cell) = p else {
                    return Ok(Value::exception_carrier(DiagnosticKind::Type, "'->' target is not a pointer", Some(range)));
                };
                let target_val = cell.borrow().clone();
                self.assign_field(target_val, &name, op, rhs, range)
            }
            Expr::Index { array, index } => {
                let a = self.eval_expr(array, env)?;
                if a.is_sentinel() {
                    return Ok(a);
                }
                let i = self.eval_expr(index, env)?;
                if i.is_sentinel() {
                    return Ok(i);
                }
                let Value::Int { value: idx, .. } = i else {
                    return Ok(Value::exception_carrier(DiagnosticKind::Type, "array index must be an integer", Some(range)));
                };
                let Value::Array(items) = a else {
                    return Ok(Value::exception_carrier(DiagnosticKind::Type, "assignment target is not an array", Some(range)));
                };
                let mut items = items.borrow_mut();
                if idx < 0 || idx as usize >= items.len() {
                    return Ok(Value::exception_carrier(DiagnosticKind::Index, format!("index {idx} out of range"), Some(range)));
                }
                let new_val = match op {
                    Some(op) => apply_binary(op, items[idx as usize].clone(), rhs, range),
                    None => rhs,
                };
                items[idx as usize] = new_val.clone();
                Ok(new_val)
            }
            _ => {
                let Some(cell) = self.lvalue_cell(target, env)? else {
                    return Ok(Value::exception_carrier(DiagnosticKind::Type, "assignment target is not an l-value", Some(range)));
                };
                let new_val = match op {
                    Some(op) => apply_binary(op, cell.borrow().clone(), rhs, range),
                    None => rhs,
                };
                *cell.borrow_mut() = new_val.clone();
                Ok(new_val)
            }
        }
    }

    fn assign_field(&self, target: Value, name: &str, op: Option<BinaryOp>, rhs: Value, range: crate::source::SourceRange) -> EvalResult {
        match target {
            Value::Object(obj) => {
                let current = obj.fields.borrow().get(name).cloned().unwrap_or(Value::Nil);
                let new_val = match op {
                    Some(op) => apply_binary(op, current, rhs, range),
                    None => rhs,
                };
                obj.fields.borrow_mut().insert(name.to_string(), new_val.clone());
                Ok(new_val)
            }
            Value::Struct(s) => {
                let current = s.fields.borrow().get(name).cloned().unwrap_or(Value::Nil);
                let new_val = match op {
                    Some(op) => apply_binary(op, current, rhs, range),
                    None => rhs,
                };
                s.fields.borrow_mut().insert(name.to_string(), new_val.clone());
                Ok(new_val)
            }
            _ => Ok(Value::exception_carrier(DiagnosticKind::Type, format!("cannot assign to field '{name}' of a non-object/struct value"), Some(range))),
        }
    }

    /// Resolves an expression to the shared cell it names, for `&`,
    /// increments, and (possibly compound) assignment. Plain-value targets
    /// (not a `Variable`, `Dereference`, or bound field) are not l-values.
    fn lvalue_cell(&mut self, id: ExprId, env: &Environment) -> Result<Option<std::rc::Rc<std::cell::RefCell<Value>>>, InternalAbort> {
        match self.program.exprs.get(id).clone() {
            Expr::Variable(name) => Ok(env.get_reference(&name)),
            Expr::Dereference(inner) => {
                let v = self.eval_expr(inner, env)?;
                match v {
                    Value::Pointer(cell) => Ok(Some(cell)),
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn eval_address_of(&mut self, inner: ExprId, env: &Environment, range: crate::source::SourceRange) -> EvalResult {
        match self.lvalue_cell(inner, env)? {
            Some(cell) => Ok(Value::Pointer(cell)),
            None => Ok(Value::exception_carrier(DiagnosticKind::Type, "cannot take the address of a non-l-value", Some(range))),
        }
    }

    fn eval_call(&mut self, callee: ExprId, args: &[ExprId], env: &Environment) -> EvalResult {
        let range = self.program.expr_range(callee);
        if let Some(result) = self.try_super_call(callee, args, env)? {
            return Ok(result);
        }
        let callee_val = self.eval_expr(callee, env)?;
        if callee_val.is_sentinel() {
            return Ok(callee_val);
        }
        let mut arg_values = Vec::with_capacity(args.len());
        for &a in args {
            let v = self.eval_expr(a, env)?;
            if v.is_sentinel() {
                return Ok(v);
            }
            arg_values.push(v);
        }
        match callee_val {
            Value::Function(closure) => self.call_closure(&closure, arg_values),
            Value::Intrinsic(name) => self.call_intrinsic(&name, arg_values, range),
            Value::Object(obj) => {
                // `obj.method(...)`: the Member access already bound the
                // instance; recover which method via the call-site name.
                let Expr::Member { name, .. } = self.program.exprs.get(callee) else {
                    return Ok(Value::exception_carrier(DiagnosticKind::Type, "value is not callable", Some(range)));
                };
                match obj.class.resolve_method(name) {
                    Some(method) => self.call_method(obj, method, arg_values, env),
                    None => Ok(Value::exception_carrier(DiagnosticKind::NameResolution, format!("no method '{name}'"), Some(range))),
                }
            }
            Value::Class(class) => {
                // A method called directly through a `Class`/bare `object`
                // namespace (e.g. `Greeter.sayHello(...)` with no
                // prior `Instantiate`) runs against a throwaway instance —
                // fine as long as the method doesn't depend on `this`'s
                // field state, which a stateless namespace method never does.
                let Expr::Member { name, .. } = self.program.exprs.get(callee) else {
                    return Ok(Value::exception_carrier(DiagnosticKind::Type, "value is not callable", Some(range)));
                };
                match class.resolve_method(name) {
                    Some(method) => {
                        let synthetic = Rc::new(ObjectInstance {
                            class: Rc::clone(&class),
                            fields: std::cell::RefCell::new(AHashMap::default()),
                            exited: std::cell::RefCell::new(false),
                        });
                        self.call_method(synthetic, method, arg_values, env)
                    }
                    None => Ok(Value::exception_carrier(DiagnosticKind::NameResolution, format!("no method '{name}'"), Some(range))),
                }
            }
            _ => Ok(Value::exception_carrier(DiagnosticKind::Type, "value is not callable", Some(range))),
        }
    }

    /// `super.Name…method(args)`: resolves starting at the parent class
    /// rather than the instance's own class.
    fn try_super_call(&mut self, callee: ExprId, args: &[ExprId], env: &Environment) -> Result<Option<Value>, InternalAbort> {
        let Expr::Member { object, name } = self.program.exprs.get(callee).clone() else { return Ok(None) };
        if !self.rooted_at_super(object) {
            return Ok(None);
        }
        let Some(Value::Object(this_obj)) = env.get("this") else { return Ok(None) };
        let Some(parent) = this_obj.class.parent.clone() else {
            return Ok(Some(Value::exception_carrier(DiagnosticKind::NameResolution, "'super' used without a parent class", None)));
        };
        let Some(method) = parent.resolve_method(&name) else {
            return Ok(Some(Value::exception_carrier(DiagnosticKind::NameResolution, format!("no method '{name}' on parent class"), None)));
        };
        let mut arg_values = Vec::with_capacity(args.len());
        for &a in args {
            let v = self.eval_expr(a, env)?;
            if v.is_sentinel() {
                return Ok(Some(v));
            }
            arg_values.push(v);
        }
        Ok(Some(self.call_method(this_obj, method, arg_values, env)?))
    }

    fn rooted_at_super(&self, id: ExprId) -> bool {
        match self.program.exprs.get(id) {
            Expr::Variable(v) => v == "super",
            Expr::Member { object, .. } => self.rooted_at_super(*object),
            _ => false,
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>) -> EvalResult {
        let Ok(_guard) = self.tracker.enter_call() else {
            return Err(InternalAbort("maximum call depth exceeded".to_string()));
        };
        let Decl::Function(f) = self.program.decls.get(closure.decl).clone() else {
            return Err(InternalAbort("closure does not reference a function declaration".to_string()));
        };
        if f.params.len() != args.len() {
            return Ok(Value::exception_carrier(
                DiagnosticKind::Arity,
                format!("'{}' expects {} argument(s), got {}", f.name, f.params.len(), args.len()),
                None,
            ));
        }
        let call_env = closure.captured_env.child();
        for (param, value) in f.params.iter().zip(args) {
            call_env.define(param.name.clone(), value);
        }
        let result = self.exec_stmt(f.body, &call_env)?;
        Ok(match result {
            Value::ReturnCarrier(v) => *v,
            Value::ExceptionCarrier(v) => Value::ExceptionCarrier(v),
            _ => Value::Nil,
        })
    }

    fn call_method(&mut self, this: Rc<ObjectInstance>, method: crate::ast::DeclId, args: Vec<Value>, env: &Environment) -> EvalResult {
        let Ok(_guard) = self.tracker.enter_call() else {
            return Err(InternalAbort("maximum call depth exceeded".to_string()));
        };
        let Decl::Function(f) = self.program.decls.get(method).clone() else {
            return Err(InternalAbort("method does not reference a function declaration".to_string()));
        };
        if f.params.len() != args.len() {
            return Ok(Value::exception_carrier(
                DiagnosticKind::Arity,
                format!("'{}' expects {} argument(s), got {}", f.name, f.params.len(), args.len()),
                None,
            ));
        }
        let call_env = self.globals.child();
        let _ = env;
        call_env.define("this", Value::Object(this));
        for (param, value) in f.params.iter().zip(args) {
            call_env.define(param.name.clone(), value);
        }
        let result = self.exec_stmt(f.body, &call_env)?;
        Ok(match result {
            Value::ReturnCarrier(v) => *v,
            Value::ExceptionCarrier(v) => Value::ExceptionCarrier(v),
            _ => Value::Nil,
        })
    }

    fn call_intrinsic(&mut self, name: &str, args: Vec<Value>, range: crate::source::SourceRange) -> EvalResult {
        let Some(arity) = intrinsics::lookup(name) else {
            return Ok(Value::exception_carrier(DiagnosticKind::Unimplemented, format!("unknown intrinsic '{name}'"), Some(range)));
        };
        if !arity.accepts(args.len()) {
            return Ok(Value::exception_carrier(DiagnosticKind::Arity, format!("'{name}' called with {} argument(s)", args.len()), Some(range)));
        }
        Ok(match name {
            "print" => {
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        self.print.print(" ");
                    }
                    let text = self.stringify(a, &self.globals.clone())?;
                    self.print.print(&text);
                }
                self.print.print("\n");
                Value::Nil
            }
            "input" => {
                let prompt = args.first().map(std::string::ToString::to_string);
                match self.input.read_line(prompt.as_deref()) {
                    Some(line) => Value::string(line),
                    None => Value::Nil,
                }
            }
            "length" => match &args[0] {
                Value::String(s) => Value::int(s.borrow().chars().count() as i64),
                Value::Array(a) => Value::int(a.borrow().len() as i64),
                _ => Value::exception_carrier(DiagnosticKind::Type, "'length' requires a string or array", Some(range)),
            },
            "to_string" => Value::string(args[0].to_string()),
            "to_number" => match &args[0] {
                Value::String(s) => s.borrow().trim().parse::<f64>().map_or_else(
                    |_| Value::exception_carrier(DiagnosticKind::Type, "'to_number' could not parse the string", Some(range)),
                    |f| Value::Float { value: f, bits: 64 },
                ),
                Value::Int { value, .. } => Value::Float { value: *value as f64, bits: 64 },
                Value::Float { .. } => args[0].clone(),
                _ => Value::exception_carrier(DiagnosticKind::Type, "'to_number' requires a string or numeric value", Some(range)),
            },
            "sqrt" => Value::Float { value: as_f64(&args[0]).sqrt(), bits: 64 },
            "sin" => Value::Float { value: as_f64(&args[0]).sin(), bits: 64 },
            "cos" => Value::Float { value: as_f64(&args[0]).cos(), bits: 64 },
            "tan" => Value::Float { value: as_f64(&args[0]).tan(), bits: 64 },
            "memalloc" => {
                let size = match &args[0] {
                    Value::Int { value, .. } => *value.max(&0),
                    _ => 0,
                };
                Value::array(vec![Value::int(0); size as usize])
            }
            "range" => {
                let (Value::Int { value: lo, .. }, Value::Int { value: hi, .. }) = (&args[0], &args[1]) else {
                    return Ok(Value::exception_carrier(DiagnosticKind::Type, "'range' requires integer bounds", Some(range)));
                };
                Value::array((*lo..*hi).map(Value::int).collect())
            }
            "__delete" => Value::Nil,
            _ => unreachable!("arity table and dispatch table are out of sync for '{name}'"),
        })
    }

    fn eval_instantiate(&mut self, class_expr: ExprId, args: &[ExprId], env: &Environment, range: crate::source::SourceRange) -> EvalResult {
        let class_val = self.eval_expr(class_expr, env)?;
        if class_val.is_sentinel() {
            return Ok(class_val);
        }
        let Value::Class(class) = class_val else {
            return Ok(Value::exception_carrier(DiagnosticKind::Type, "instantiation target is not a class", Some(range)));
        };
        let mut arg_values = Vec::with_capacity(args.len());
        for &a in args {
            let v = self.eval_expr(a, env)?;
            if v.is_sentinel() {
                return Ok(v);
            }
            arg_values.push(v);
        }
        let mut fields = AHashMap::default();
        for (name, init) in &class.field_defaults {
            let default = match init {
                Some(e) => self.eval_expr(*e, env)?,
                None => Value::Nil,
            };
            if default.is_sentinel() {
                return Ok(default);
            }
            fields.insert(name.clone(), default);
        }
        let instance = Rc::new(ObjectInstance { class: Rc::clone(&class), fields: std::cell::RefCell::new(fields), exited: std::cell::RefCell::new(false) });
        if class.capabilities.init {
            if let Some(method) = class.resolve_method("__init") {
                let result = self.call_method(Rc::clone(&instance), method, arg_values, env)?;
                if let Value::ExceptionCarrier(_) = result {
                    return Ok(result);
                }
            }
        }
        Ok(Value::Object(instance))
    }
}

fn capabilities_from_methods(methods: &AHashMap<String, crate::ast::DeclId>) -> Capabilities {
    Capabilities {
        init: methods.contains_key("__init"),
        exit: methods.contains_key("__exit"),
        add: methods.contains_key("__add"),
        sub: methods.contains_key("__sub"),
        mul: methods.contains_key("__mul"),
        div: methods.contains_key("__div"),
        eq: methods.contains_key("__eq"),
        lt: methods.contains_key("__lt"),
        expr: methods.contains_key("__expr"),
    }
}

fn literal_value(lit: &LiteralValue) -> Value {
    match lit {
        LiteralValue::Int(v) => Value::int(*v),
        LiteralValue::Float(v) => Value::Float { value: *v, bits: 64 },
        LiteralValue::Bool(v) => Value::Bool(*v),
        LiteralValue::Char(v) => Value::Char(*v),
        LiteralValue::Str(v) => Value::string(v.clone()),
        LiteralValue::Null => Value::Nil,
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int { value, .. } => *value as f64,
        Value::Float { value, .. } => *value,
        _ => f64::NAN,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int { value: x, .. }, Value::Int { value: y, .. }) => x == y,
        (Value::Float { value: x, .. }, Value::Float { value: y, .. }) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Char(x), Value::Char(y)) => x == y,
        (Value::String(x), Value::String(y)) => *x.borrow() == *y.borrow(),
        (Value::Nil, Value::Nil) => true,
        _ => false,
    }
}

/// Widens to a common type, applies the operator, and maps failure modes to
/// the appropriate diagnostic kind (integer division truncates
/// toward zero, modulo follows the dividend's sign, float division by zero
/// follows IEEE-754 rather than raising).
fn apply_binary(op: BinaryOp, l: Value, r: Value, range: crate::source::SourceRange) -> Value {
    use BinaryOp::*;
    match op {
        Eq => return Value::Bool(values_equal(&l, &r)),
        Ne => return Value::Bool(!values_equal(&l, &r)),
        // Truthiness-based like `and`/`or`, not bitwise, so it applies to
        // any operand type rather than only integers.
        Xor => return Value::Bool(l.is_truthy() ^ r.is_truthy()),
        _ => {}
    }
    match (&l, &r) {
        (Value::String(x), Value::String(y)) if op == Add => {
            return Value::string(format!("{}{}", x.borrow(), y.borrow()));
        }
        (Value::Bool(x), Value::Bool(y)) => {
            return match op {
                Lt => Value::Bool(!x & y),
                Gt => Value::Bool(*x & !y),
                Le => Value::Bool(x <= y),
                Ge => Value::Bool(x >= y),
                And => Value::Bool(*x && *y),
                Or => Value::Bool(*x || *y),
                _ => Value::exception_carrier(DiagnosticKind::Type, "incompatible operand types", Some(range)),
            };
        }
        _ => {}
    }
    let (lf, rf, use_float) = match (&l, &r) {
        (Value::Float { .. }, _) | (_, Value::Float { .. }) => (as_f64(&l), as_f64(&r), true),
        (Value::Int { .. }, Value::Int { .. }) => (0.0, 0.0, false),
        _ => return Value::exception_carrier(DiagnosticKind::Type, "incompatible operand types for binary operator", Some(range)),
    };
    if use_float {
        let result = match op {
            Add => lf + rf,
            Sub => lf - rf,
            Mul => lf * rf,
            Div => lf / rf,
            Mod => lf % rf,
            Pow => lf.powf(rf),
            Lt => return Value::Bool(lf < rf),
            Gt => return Value::Bool(lf > rf),
            Le => return Value::Bool(lf <= rf),
            Ge => return Value::Bool(lf >= rf),
            _ => return Value::exception_carrier(DiagnosticKind::Type, "operator not defined for float operands", Some(range)),
        };
        return Value::Float { value: result, bits: 64 };
    }
    let (Value::Int { value: a, bits: ab, signed: asig }, Value::Int { value: b, bits: bb, signed: bsig }) = (l, r) else {
        unreachable!()
    };
    let bits = ab.max(bb);
    let signed = asig && bsig;
    match op {
        Add => Value::Int { value: a.wrapping_add(b), bits, signed },
        Sub => Value::Int { value: a.wrapping_sub(b), bits, signed },
        Mul => Value::Int { value: a.wrapping_mul(b), bits, signed },
        Div => {
            if b == 0 {
                Value::exception_carrier(DiagnosticKind::Arithmetic, "integer division by zero", Some(range))
            } else {
                Value::Int { value: a.wrapping_div(b), bits, signed }
            }
        }
        Mod => {
            if b == 0 {
                Value::exception_carrier(DiagnosticKind::Arithmetic, "integer modulo by zero", Some(range))
            } else {
                Value::Int { value: a.wrapping_rem(b), bits, signed }
            }
        }
        Pow => Value::Int { value: (a as f64).powi(b as i32) as i64, bits, signed },
        Lt => Value::Bool(a < b),
        Gt => Value::Bool(a > b),
        Le => Value::Bool(a <= b),
        Ge => Value::Bool(a >= b),
        BitAnd => Value::Int { value: a & b, bits, signed },
        BitOr => Value::Int { value: a | b, bits, signed },
        BitXor => Value::Int { value: a ^ b, bits, signed },
        Shl => Value::Int { value: a.wrapping_shl(b as u32), bits, signed },
        Shr => Value::Int { value: a.wrapping_shr(b as u32), bits, signed },
        And | Or => unreachable!("short-circuit operators are handled by the caller"),
        Eq | Ne | Xor => unreachable!("handled above"),
    }
}

/// A conservative, architecture-agnostic size estimate; `sizeof` in Flux
/// programs is rarely used for anything beyond a sanity-check print.
fn approximate_size_of(v: &Value) -> i64 {
    match v {
        Value::Bool(_) | Value::Char(_) => 1,
        Value::Int { bits, .. } | Value::Float { bits, .. } => i64::from(*bits) / 8,
        Value::Pointer(_) => 8,
        Value::String(s) => s.borrow().len() as i64,
        Value::Array(a) => a.borrow().len() as i64 * 8,
        _ => 8,
    }
}

fn approximate_size_of_type(program: &Program, ty: crate::ast::TypeId) -> i64 {
    match program.types.get(ty) {
        crate::ast::TypeExpr::Bool | crate::ast::TypeExpr::Char => 1,
        crate::ast::TypeExpr::Int { bits, .. } | crate::ast::TypeExpr::Float { bits } => i64::from(*bits) / 8,
        crate::ast::TypeExpr::Pointer(_) => 8,
        crate::ast::TypeExpr::Void => 0,
        _ => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CollectingIo;
    use crate::parser::parse;
    use crate::resource::NoLimitTracker;
    use crate::source::Source;

    fn run_source(src: &str) -> (RunOutcome, String) {
        let source = Source::new("t.fx", src);
        let mut errors = ErrorCollector::new();
        let (program, _symbols, _types) = parse(&source, &mut errors);
        assert!(!errors.had_error(), "parse errors: {:?}", errors.diagnostics());
        let mut io = CollectingIo::new();
        let tracker = NoLimitTracker::default();
        let mut io_input = CollectingIo::new();
        let outcome = run(&program, &mut errors, &mut io, &mut io_input, &tracker).expect("no internal abort");
        (outcome, io.output())
    }

    #[test]
    fn hello_world_prints_and_returns_zero() {
        let (outcome, output) = run_source(r#"def main()->int{ print("hi"); return 0; };"#);
        assert_eq!(output, "hi\n");
        assert!(matches!(outcome, RunOutcome::Completed(Value::Int { value: 0, .. })));
    }

    #[test]
    fn pointer_mutation_through_address_of() {
        let src = r#"def main()->int{ int x=10; int* p=@x; *p += 5; print(i"{}":{x;}); return 0; };"#;
        let (_outcome, output) = run_source(src);
        assert_eq!(output, "15\n");
    }

    #[test]
    fn division_by_zero_is_caught() {
        let src = "def main()->int{ int d=0; try{ int q=10/d; } catch(auto e){ print(\"caught\"); } return 0; };";
        let (_outcome, output) = run_source(src);
        assert_eq!(output, "caught\n");
    }

    #[test]
    fn for_in_range_prints_each_bound() {
        let src = "def main()->int{ for (i in 1..5) { print(i); }; return 0; };";
        let (_outcome, output) = run_source(src);
        assert_eq!(output, "1\n2\n3\n4\n");
    }

    #[test]
    fn missing_main_is_reported_as_no_entry_point() {
        let (outcome, _) = run_source("def helper()->int{ return 1; };");
        assert!(matches!(outcome, RunOutcome::NoEntryPoint));
    }

    #[test]
    fn truncating_division_and_sign_of_dividend_modulo() {
        let src = "def main()->int{ int a = -7/2; int b = -7%2; print(i\"{} {}\":{a;b;}); return 0; };";
        let (_outcome, output) = run_source(src);
        assert_eq!(output, "-3 -1\n");
    }
}
